//! Round-trip integration tests.
//!
//! A tree parsed from well-formed input under a given option set must
//! re-render byte-for-byte under the same option set. Fixtures are written
//! to the serializer's conventions: no newline after the XML declaration
//! unless whitespace preservation supplies one, and all five XML entities
//! escaped in character data.

#![allow(clippy::unwrap_used)]

use xmlbind::{Document, ParseError, XmlOptions};

fn assert_roundtrip(input: &str, options: &XmlOptions) {
    let doc = Document::parse_str_with_options(input, options)
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    assert_eq!(doc.render(options), input);
}

// --- The four {preserve_whitespace, preserve_cdata} combinations ---

#[test]
fn test_roundtrip_defaults() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
               <order id=\"17\"><item sku=\"w-1\">Widget</item><qty>2</qty>\
               <note>5 &gt; 3 &amp; 2 &lt; 4</note></order>";
    assert_roundtrip(xml, &XmlOptions::default());
}

#[test]
fn test_roundtrip_preserve_whitespace() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
               <order id=\"17\">\n  <item>Widget</item>\n  <qty>2</qty>\n</order>\n";
    let options = XmlOptions::default().preserve_whitespace(true);
    assert_roundtrip(xml, &options);
}

#[test]
fn test_roundtrip_preserve_cdata() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
               <script><![CDATA[if (a < b && b > c) { run(); }]]></script>";
    let options = XmlOptions::default().preserve_cdata(true);
    assert_roundtrip(xml, &options);
}

#[test]
fn test_roundtrip_preserve_both() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
               <doc>\n  <script><![CDATA[x < y]]></script>\n  <p>text</p>\n</doc>\n";
    let options = XmlOptions::default()
        .preserve_whitespace(true)
        .preserve_cdata(true);
    assert_roundtrip(xml, &options);
}

// --- Other option interactions ---

#[test]
fn test_roundtrip_compact_empty_elements() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
               <list><item id=\"1\"/><item id=\"2\"/></list>";
    let options = XmlOptions::default().compact_empty_elements(true);
    assert_roundtrip(xml, &options);
}

#[test]
fn test_roundtrip_namespaces_and_standalone() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
               <svg xmlns=\"http://www.w3.org/2000/svg\" \
               xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"10\">\
               <use xlink:href=\"#a\"></use></svg>";
    assert_roundtrip(xml, &XmlOptions::default());
}

#[test]
fn test_roundtrip_comments() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
               <a><!-- keep me --><b>x</b></a>";
    assert_roundtrip(xml, &XmlOptions::default());
}

#[test]
fn test_roundtrip_prolog_comment_with_whitespace() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
               <!-- header -->\n<a>x</a>\n";
    let options = XmlOptions::default().preserve_whitespace(true);
    assert_roundtrip(xml, &options);
}

#[test]
fn test_cdata_dropped_without_preservation() {
    // Without preserve_cdata the section is merged into plain text and
    // re-rendered escaped.
    let doc = Document::parse_str("<a><![CDATA[x < y]]></a>").unwrap();
    let rendered = doc.render(&XmlOptions::default());
    assert!(rendered.ends_with("<a>x &lt; y</a>"));
}

// --- Byte input ---

#[test]
fn test_parse_bytes_utf16_little_endian() {
    let text = "<greet>héllo</greet>";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let doc = Document::parse_bytes(&bytes).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.string_value(root), "héllo");
}

#[test]
fn test_parse_bytes_declared_latin1() {
    let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</a>");
    let doc = Document::parse_bytes(&bytes).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.string_value(root), "café");
}

// --- Error reporting ---

#[test]
fn test_empty_input_is_distinct_from_malformed() {
    assert_eq!(Document::parse_str(""), Err(ParseError::EmptyDocument));
    assert_eq!(
        Document::parse_str("<!-- nothing here -->"),
        Err(ParseError::EmptyDocument)
    );
    assert!(matches!(
        Document::parse_str("<a><b></a>"),
        Err(ParseError::Malformed { .. })
    ));
}

#[test]
fn test_malformed_error_location() {
    let err = Document::parse_str("<a>\n<b attr=oops/>\n</a>").unwrap_err();
    match err {
        ParseError::Malformed { location, .. } => {
            assert_eq!(location.line, 2);
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn test_deeply_nested_input_is_rejected_not_fatal() {
    // 200k levels must come back as a parse error, not blow the stack.
    let mut xml = String::with_capacity(200_000 * 8);
    for _ in 0..200_000 {
        xml.push_str("<a>");
    }
    for _ in 0..200_000 {
        xml.push_str("</a>");
    }
    let err = Document::parse_str(&xml).unwrap_err();
    match err {
        ParseError::Malformed { message, .. } => assert!(message.contains("nesting")),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn test_second_root_element_is_malformed() {
    assert!(matches!(
        Document::parse_str("<a></a><b></b>"),
        Err(ParseError::Malformed { .. })
    ));
}
