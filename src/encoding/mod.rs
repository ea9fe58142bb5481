//! Character encoding detection and transcoding.
//!
//! Byte input is converted to UTF-8 before parsing. Detection follows the
//! usual two-stage approach: a BOM wins outright, otherwise the XML
//! declaration is scanned for an `encoding` pseudo-attribute (the
//! declaration itself is ASCII-compatible in every encoding we accept).
//! Absent both, UTF-8 is assumed.
//!
//! Transcoding is delegated to `encoding_rs`, which covers the WHATWG
//! encoding set (UTF-8, UTF-16, the ISO-8859 family, windows codepages).

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// Failure to decode byte input into UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Detects the encoding of `input` from its BOM, if it carries one.
#[must_use]
pub fn detect_bom(input: &[u8]) -> Option<&'static Encoding> {
    if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(UTF_8)
    } else if input.starts_with(&[0xFF, 0xFE]) {
        Some(UTF_16LE)
    } else if input.starts_with(&[0xFE, 0xFF]) {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Extracts the encoding name from an XML declaration at the start of
/// `input`, if present. Only inspects the first 256 bytes.
#[must_use]
pub fn declared_encoding(input: &[u8]) -> Option<String> {
    let head = &input[..input.len().min(256)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let after = decl.split("encoding").nth(1)?;
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &after[1..];
    let close = value.find(quote)?;
    Some(value[..close].to_string())
}

/// Decodes raw bytes into UTF-8 text.
///
/// Encoding is determined by BOM, then by the XML declaration, then
/// defaults to UTF-8. A BOM, if present, is left in the output for the
/// caller to strip.
///
/// # Errors
///
/// Returns [`EncodingError`] when the declared encoding is unknown or the
/// bytes are not valid in the chosen encoding.
pub fn decode_to_utf8(input: &[u8]) -> Result<String, EncodingError> {
    let encoding = if let Some(enc) = detect_bom(input) {
        enc
    } else if let Some(name) = declared_encoding(input) {
        Encoding::for_label(name.as_bytes()).ok_or_else(|| EncodingError {
            message: format!("unknown encoding '{name}'"),
        })?
    } else {
        UTF_8
    };

    let (text, _, had_errors) = encoding.decode(input);
    if had_errors {
        return Err(EncodingError {
            message: format!("input is not valid {}", encoding.name()),
        });
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8_bom() {
        assert_eq!(detect_bom(&[0xEF, 0xBB, 0xBF, b'<']), Some(UTF_8));
    }

    #[test]
    fn test_detect_utf16_boms() {
        assert_eq!(detect_bom(&[0xFF, 0xFE, b'<', 0]), Some(UTF_16LE));
        assert_eq!(detect_bom(&[0xFE, 0xFF, 0, b'<']), Some(UTF_16BE));
    }

    #[test]
    fn test_no_bom() {
        assert_eq!(detect_bom(b"<root/>"), None);
    }

    #[test]
    fn test_declared_encoding() {
        let input = br#"<?xml version="1.0" encoding="ISO-8859-1"?><a/>"#;
        assert_eq!(declared_encoding(input), Some("ISO-8859-1".to_string()));
    }

    #[test]
    fn test_declared_encoding_absent() {
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_to_utf8("<a>héllo</a>".as_bytes()).unwrap(), "<a>héllo</a>");
    }

    #[test]
    fn test_decode_latin1_via_declaration() {
        let mut input = br#"<?xml version="1.0" encoding="ISO-8859-1"?><a>"#.to_vec();
        input.push(0xE9); // 'é' in latin-1
        input.extend_from_slice(b"</a>");
        let text = decode_to_utf8(&input).unwrap();
        assert!(text.ends_with("<a>\u{e9}</a>"));
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        let text = "<a/>";
        let mut input = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            input.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_to_utf8(&input).unwrap();
        assert_eq!(decoded.trim_start_matches('\u{FEFF}'), text);
    }

    #[test]
    fn test_decode_unknown_encoding_errors() {
        let input = br#"<?xml version="1.0" encoding="EBCDIC-FANTASY"?><a/>"#;
        assert!(decode_to_utf8(input).is_err());
    }
}
