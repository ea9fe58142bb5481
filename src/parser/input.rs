//! Low-level parser input cursor.
//!
//! `ParserInput` tracks position, line, and column over a UTF-8 input and
//! provides the primitive operations the scanner is built from: peeking,
//! advancing, name and quoted-value parsing, and decoding of the builtin
//! entity and character references.

use crate::error::{ParseError, SourceLocation};

/// Whether `c` may start an XML name (XML 1.0 §2.3, without the full
/// Unicode ranges libxml2 carries — letters, `_`, `:` and the common
/// supplementary blocks).
pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c == '_'
        || c == ':'
        || ('\u{C0}'..='\u{D6}').contains(&c)
        || ('\u{D8}'..='\u{F6}').contains(&c)
        || ('\u{F8}'..='\u{2FF}').contains(&c)
        || ('\u{370}'..='\u{37D}').contains(&c)
        || ('\u{37F}'..='\u{1FFF}').contains(&c)
        || ('\u{200C}'..='\u{200D}').contains(&c)
        || ('\u{2C00}'..='\u{2FEF}').contains(&c)
        || ('\u{3001}'..='\u{D7FF}').contains(&c)
        || ('\u{F900}'..='\u{FDCF}').contains(&c)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&c)
        || ('\u{10000}'..='\u{EFFFF}').contains(&c)
}

/// Whether `c` may continue an XML name.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || c.is_ascii_digit()
        || c == '-'
        || c == '.'
        || c == '\u{B7}'
        || ('\u{300}'..='\u{36F}').contains(&c)
        || ('\u{203F}'..='\u{2040}').contains(&c)
}

/// The low-level input state shared by the scanner.
pub(crate) struct ParserInput<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> ParserInput<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current source location (line/column are 1-based).
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(s)
    }

    /// Advances `count` bytes, updating line/column. Column counts
    /// characters, so UTF-8 continuation bytes do not bump it.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            let Some(&b) = self.bytes.get(self.pos) else {
                return;
            };
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }

    /// Consumes and returns the next character.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let Some(c) = self.text[self.pos..].chars().next() else {
            return Err(self.fatal("unexpected end of input"));
        };
        self.advance(c.len_utf8());
        Ok(c)
    }

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.advance(1);
            Ok(())
        } else {
            Err(self.fatal(format!("expected '{}'", expected as char)))
        }
    }

    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        if self.looking_at(expected) {
            self.advance(expected.len());
            Ok(())
        } else {
            Err(self.fatal(format!(
                "expected '{}'",
                String::from_utf8_lossy(expected)
            )))
        }
    }

    /// Skips XML whitespace (space, tab, CR, LF). Returns whether any was
    /// skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        self.pos > start
    }

    /// Consumes a run of XML whitespace and returns it verbatim.
    pub fn consume_whitespace(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        &self.text[start..self.pos]
    }

    /// Parses an XML name (element, attribute, or namespace-qualified).
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let Some(first) = self.text[self.pos..].chars().next() else {
            return Err(self.fatal("unexpected end of input, expected a name"));
        };
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character '{first}'")));
        }
        self.advance(first.len_utf8());
        while let Some(c) = self.text[self.pos..].chars().next() {
            if !is_name_char(c) {
                break;
            }
            self.advance(c.len_utf8());
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// Parses a quoted attribute value, decoding entity and character
    /// references. A raw `<` inside the value is a well-formedness error.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("expected quoted attribute value")),
        };
        self.advance(1);
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unterminated attribute value")),
                Some(q) if q == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'<') => {
                    return Err(self.fatal("'<' is not allowed in attribute values"));
                }
                Some(b'&') => {
                    let decoded = self.parse_reference()?;
                    value.push(decoded);
                }
                Some(_) => value.push(self.next_char()?),
            }
        }
    }

    /// Parses an entity or character reference starting at `&`.
    ///
    /// Only the five builtin entities and decimal/hex character references
    /// are recognized; DTD-declared entities are out of scope.
    pub fn parse_reference(&mut self) -> Result<char, ParseError> {
        self.expect_byte(b'&')?;
        if self.peek() == Some(b'#') {
            self.advance(1);
            let radix = if self.peek() == Some(b'x') {
                self.advance(1);
                16
            } else {
                10
            };
            let start = self.pos;
            while let Some(b) = self.peek() {
                if b == b';' {
                    break;
                }
                self.advance(1);
            }
            let digits = &self.text[start..self.pos];
            self.expect_byte(b';')?;
            let code = u32::from_str_radix(digits, radix)
                .map_err(|_| self.fatal(format!("invalid character reference '&#{digits};'")))?;
            char::from_u32(code)
                .ok_or_else(|| self.fatal(format!("character reference out of range: {code}")))
        } else {
            let name = self.parse_name()?;
            self.expect_byte(b';')?;
            match name.as_str() {
                "amp" => Ok('&'),
                "lt" => Ok('<'),
                "gt" => Ok('>'),
                "apos" => Ok('\''),
                "quot" => Ok('"'),
                _ => Err(self.fatal(format!("unknown entity reference '&{name};'"))),
            }
        }
    }

    /// Consumes input up to (and including) `marker`, returning the text
    /// before the marker.
    pub fn take_until(&mut self, marker: &[u8]) -> Result<&'a str, ParseError> {
        let start = self.pos;
        while !self.at_end() {
            if self.looking_at(marker) {
                let content = &self.text[start..self.pos];
                self.advance(marker.len());
                return Ok(content);
            }
            self.advance(1);
        }
        Err(self.fatal(format!(
            "unexpected end of input, expected '{}'",
            String::from_utf8_lossy(marker)
        )))
    }

    /// Builds a malformed-markup error at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            message: message.into(),
            location: self.location(),
        }
    }
}
