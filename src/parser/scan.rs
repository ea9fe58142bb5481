//! Event-driven XML scanner.
//!
//! A single-pass scan over the input firing start-element, end-element,
//! character-data, CDATA, and comment events on a [`ScanHandler`]. The
//! scanner enforces well-formedness (matching end tags, a single root
//! element, no content after the root) but applies no whitespace or CDATA
//! policy — that belongs to the handler.
//!
//! Prolog and epilog character data (whitespace outside the root element)
//! is reported through the ordinary `characters` event, so a handler that
//! preserves whitespace sees the complete document.

use crate::error::ParseError;

use super::input::ParserInput;

/// Maximum element nesting depth. The scanner recurses once per level, so
/// unbounded depth would exhaust the thread stack on hostile input.
const MAX_DEPTH: usize = 256;

/// The parsed XML declaration, if the document carried one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlDecl {
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Receiver for scanner events. All methods default to no-ops.
#[allow(unused_variables)]
pub(crate) trait ScanHandler {
    /// Fired once if the document starts with an XML declaration.
    fn xml_declaration(&mut self, decl: &XmlDecl) {}

    /// Fired at each element start tag. Attributes arrive as
    /// `(name, value)` pairs in declaration order, values already decoded.
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) {}

    /// Fired at each element end tag (including self-closing tags).
    fn end_element(&mut self, name: &str) {}

    /// Fired for each run of character data, entity references decoded.
    /// Whitespace-only runs are reported too, including outside the root.
    fn characters(&mut self, content: &str) {}

    /// Fired for each CDATA section, content verbatim.
    fn cdata(&mut self, content: &str) {}

    /// Fired for each comment, without the `<!--`/`-->` delimiters.
    fn comment(&mut self, content: &str) {}
}

/// Scans `text`, firing events on `handler`.
///
/// Returns [`ParseError::EmptyDocument`] when the input contains no root
/// element — a distinct condition from malformed markup.
pub(crate) fn scan(text: &str, handler: &mut dyn ScanHandler) -> Result<(), ParseError> {
    let mut input = ParserInput::new(text);

    // XML declaration — must be at the very start of the input.
    if input.looking_at(b"<?xml")
        && matches!(input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n' | b'?'))
    {
        let decl = parse_xml_declaration(&mut input)?;
        handler.xml_declaration(&decl);
    }

    // Prolog: whitespace, comments, PIs, an optional DOCTYPE.
    scan_misc(&mut input, handler)?;

    let mut saw_root = false;
    if input.peek() == Some(b'<')
        && input
            .peek_at(1)
            .is_some_and(|b| b != b'!' && b != b'?' && b != b'/')
    {
        scan_element(&mut input, handler, 0)?;
        saw_root = true;
    }

    // Epilog: trailing whitespace and comments.
    scan_misc(&mut input, handler)?;

    if !input.at_end() {
        return Err(input.fatal("content after document element"));
    }
    if !saw_root {
        return Err(ParseError::EmptyDocument);
    }
    Ok(())
}

/// Parses the XML declaration after the leading `<?xml` has been sighted.
fn parse_xml_declaration(input: &mut ParserInput<'_>) -> Result<XmlDecl, ParseError> {
    input.expect_str(b"<?xml")?;
    let mut decl = XmlDecl::default();
    loop {
        input.skip_whitespace();
        if input.looking_at(b"?>") {
            input.advance(2);
            return Ok(decl);
        }
        let name = input.parse_name()?;
        input.skip_whitespace();
        input.expect_byte(b'=')?;
        input.skip_whitespace();
        let value = input.parse_attribute_value()?;
        match name.as_str() {
            "version" => decl.version = Some(value),
            "encoding" => decl.encoding = Some(value),
            "standalone" => match value.as_str() {
                "yes" => decl.standalone = Some(true),
                "no" => decl.standalone = Some(false),
                other => {
                    return Err(input.fatal(format!("invalid standalone value '{other}'")));
                }
            },
            other => {
                return Err(input.fatal(format!("unexpected XML declaration attribute '{other}'")));
            }
        }
    }
}

/// Scans misc content outside the root element: whitespace (reported as
/// characters), comments, processing instructions (skipped — they have no
/// counterpart in the node model), and a DOCTYPE declaration (skipped;
/// DTDs are not interpreted).
fn scan_misc(input: &mut ParserInput<'_>, handler: &mut dyn ScanHandler) -> Result<(), ParseError> {
    loop {
        let ws = input.consume_whitespace();
        if !ws.is_empty() {
            handler.characters(ws);
        }
        if input.looking_at(b"<!--") {
            scan_comment(input, handler)?;
        } else if input.looking_at(b"<!DOCTYPE") {
            skip_doctype(input)?;
        } else if input.looking_at(b"<?") {
            skip_pi(input)?;
        } else {
            return Ok(());
        }
    }
}

fn scan_comment(
    input: &mut ParserInput<'_>,
    handler: &mut dyn ScanHandler,
) -> Result<(), ParseError> {
    input.expect_str(b"<!--")?;
    let content = input.take_until(b"-->")?;
    if content.contains("--") {
        return Err(input.fatal("'--' is not allowed inside comments"));
    }
    handler.comment(content);
    Ok(())
}

fn skip_pi(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<?")?;
    input.take_until(b"?>")?;
    Ok(())
}

/// Skips a DOCTYPE declaration, including a bracketed internal subset.
fn skip_doctype(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<!DOCTYPE")?;
    let mut bracket_depth: u32 = 0;
    loop {
        match input.peek() {
            None => return Err(input.fatal("unexpected end of input in DOCTYPE")),
            Some(b'[') => {
                bracket_depth += 1;
                input.advance(1);
            }
            Some(b']') => {
                bracket_depth = bracket_depth.saturating_sub(1);
                input.advance(1);
            }
            Some(q @ (b'"' | b'\'')) => {
                input.advance(1);
                while input.peek().is_some_and(|b| b != q) {
                    input.advance(1);
                }
                input.expect_byte(q)?;
            }
            Some(b'>') if bracket_depth == 0 => {
                input.advance(1);
                return Ok(());
            }
            Some(_) => input.advance(1),
        }
    }
}

/// Scans one element and its content, recursively. `depth` is the number
/// of open ancestor elements; past [`MAX_DEPTH`] the input is rejected.
fn scan_element(
    input: &mut ParserInput<'_>,
    handler: &mut dyn ScanHandler,
    depth: usize,
) -> Result<(), ParseError> {
    if depth >= MAX_DEPTH {
        return Err(input.fatal(format!(
            "element nesting exceeds the maximum depth of {MAX_DEPTH}"
        )));
    }
    input.expect_byte(b'<')?;
    let name = input.parse_name()?;

    // Attributes, in declaration order.
    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
        let had_ws = input.skip_whitespace();
        match input.peek() {
            Some(b'/') => {
                input.advance(1);
                input.expect_byte(b'>')?;
                handler.start_element(&name, &attributes);
                handler.end_element(&name);
                return Ok(());
            }
            Some(b'>') => {
                input.advance(1);
                break;
            }
            Some(_) if had_ws => {
                let attr_name = input.parse_name()?;
                input.skip_whitespace();
                input.expect_byte(b'=')?;
                input.skip_whitespace();
                let attr_value = input.parse_attribute_value()?;
                if attributes.iter().any(|(n, _)| *n == attr_name) {
                    return Err(input.fatal(format!("duplicate attribute '{attr_name}'")));
                }
                attributes.push((attr_name, attr_value));
            }
            _ => return Err(input.fatal("expected attribute, '>' or '/>'")),
        }
    }
    handler.start_element(&name, &attributes);

    // Content until the matching end tag.
    loop {
        match input.peek() {
            None => {
                return Err(input.fatal(format!("unexpected end of input inside <{name}>")));
            }
            Some(b'<') if input.looking_at(b"</") => {
                input.advance(2);
                let end_name = input.parse_name()?;
                if end_name != name {
                    return Err(input.fatal(format!(
                        "mismatched end tag: expected </{name}>, found </{end_name}>"
                    )));
                }
                input.skip_whitespace();
                input.expect_byte(b'>')?;
                handler.end_element(&name);
                return Ok(());
            }
            Some(b'<') if input.looking_at(b"<![CDATA[") => {
                input.advance(9);
                let content = input.take_until(b"]]>")?;
                handler.cdata(content);
            }
            Some(b'<') if input.looking_at(b"<!--") => {
                scan_comment(input, handler)?;
            }
            Some(b'<') if input.looking_at(b"<?") => {
                skip_pi(input)?;
            }
            Some(b'<') => {
                scan_element(input, handler, depth + 1)?;
            }
            Some(_) => {
                let text = scan_text_run(input)?;
                handler.characters(&text);
            }
        }
    }
}

/// Consumes character data up to the next `<`, decoding references.
fn scan_text_run(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    let mut text = String::new();
    loop {
        match input.peek() {
            None | Some(b'<') => return Ok(text),
            Some(b'&') => text.push(input.parse_reference()?),
            Some(_) => text.push(input.next_char()?),
        }
    }
}
