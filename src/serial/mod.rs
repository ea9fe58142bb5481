//! XML serialization.
//!
//! Rendering is deterministic: a given tree and option set always produce
//! the same bytes. Within an element the output order is fixed as namespace
//! declarations, then attributes, then children, each in stored order.
//!
//! Text content escapes all five XML entities (`&`, `<`, `>`, `"`, `'`) in
//! both character data and attribute values. A Text node flagged for CDATA
//! is emitted as a CDATA section only when `preserve_cdata` is set;
//! otherwise it is escaped like any other text.

use crate::options::XmlOptions;
use crate::tree::{Document, NodeId, NodeKind};

/// Renders a document to a string.
///
/// The XML declaration is always emitted, defaulting to version 1.0 and
/// UTF-8 when the document does not carry values of its own. No newline
/// follows the declaration; a document parsed with `preserve_whitespace`
/// supplies its own prolog whitespace as Text nodes.
#[must_use]
pub fn render(doc: &Document, options: &XmlOptions) -> String {
    let mut out = String::new();
    render_declaration(doc, &mut out);
    for &child in doc.children(doc.root()) {
        render_node(doc, child, options, &mut out);
    }
    out
}

/// Renders a single element subtree, without an XML declaration.
#[must_use]
pub fn render_element(doc: &Document, id: NodeId, options: &XmlOptions) -> String {
    let mut out = String::new();
    render_node(doc, id, options, &mut out);
    out
}

fn render_declaration(doc: &Document, out: &mut String) {
    out.push_str("<?xml version=\"");
    out.push_str(doc.version.as_deref().unwrap_or("1.0"));
    out.push_str("\" encoding=\"");
    out.push_str(doc.encoding.as_deref().unwrap_or("UTF-8"));
    out.push('"');
    if let Some(standalone) = doc.standalone {
        out.push_str(" standalone=\"");
        out.push_str(if standalone { "yes" } else { "no" });
        out.push('"');
    }
    out.push_str("?>");
}

fn render_node(doc: &Document, id: NodeId, options: &XmlOptions, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Element => render_element_node(doc, id, options, out),
        NodeKind::Text => render_text(doc, id, options, out),
        NodeKind::Comment => {
            out.push_str("<!--");
            if let Some(v) = doc.value(id) {
                push_comment(v, out);
            }
            out.push_str("-->");
        }
        // Attribute and Namespace nodes render as part of their element;
        // a Document node never appears in a child list.
        NodeKind::Attribute | NodeKind::Namespace | NodeKind::Document => {}
    }
}

fn render_element_node(doc: &Document, id: NodeId, options: &XmlOptions, out: &mut String) {
    let name = doc.name(id).unwrap_or_default();
    out.push('<');
    out.push_str(name);

    for &ns in doc.namespaces(id) {
        out.push(' ');
        match doc.name(ns) {
            Some(prefix) => {
                out.push_str("xmlns:");
                out.push_str(prefix);
            }
            None => out.push_str("xmlns"),
        }
        out.push_str("=\"");
        push_escaped(doc.value(ns).unwrap_or_default(), out);
        out.push('"');
    }

    for &attr in doc.attributes(id) {
        out.push(' ');
        out.push_str(doc.name(attr).unwrap_or_default());
        out.push_str("=\"");
        push_escaped(doc.value(attr).unwrap_or_default(), out);
        out.push('"');
    }

    let children = doc.children(id);
    if children.is_empty() && options.compact_empty_elements {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for &child in children {
        render_node(doc, child, options, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn render_text(doc: &Document, id: NodeId, options: &XmlOptions, out: &mut String) {
    let value = doc.value(id).unwrap_or_default();
    if doc.node(id).cdata && options.preserve_cdata {
        out.push_str("<![CDATA[");
        // A literal "]]>" cannot appear inside a CDATA section; split it
        // across two sections.
        out.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
        out.push_str("]]>");
    } else {
        push_escaped(value, out);
    }
}

/// Comment text cannot contain `--` and cannot end with `-`. Parsed input
/// never does (the scanner rejects it), but programmatically built
/// comments can; a space is inserted to keep the output well-formed.
fn push_comment(value: &str, out: &mut String) {
    let mut prev_dash = false;
    for c in value.chars() {
        if prev_dash && c == '-' {
            out.push(' ');
        }
        out.push(c);
        prev_dash = c == '-';
    }
    if prev_dash {
        out.push(' ');
    }
}

/// Escapes the five XML entities.
fn push_escaped(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}
