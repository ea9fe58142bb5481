//! XML parsing into the document tree.
//!
//! Parsing is split into a scanner and a builder. The scanner
//! ([`scan::scan`]) walks the input once and fires events; the
//! [`TreeBuilder`] consumes them and assembles a [`Document`], applying the
//! policies from [`XmlOptions`]:
//!
//! - whitespace-only character runs are dropped unless
//!   `preserve_whitespace` is set, in which case they become Text nodes
//!   (including runs before and after the root element, which attach to the
//!   document node);
//! - CDATA sections become ordinary Text nodes unless `preserve_cdata` is
//!   set, in which case the Text node is flagged for CDATA rendering;
//! - `xmlns` and `xmlns:prefix` attributes become Namespace nodes rather
//!   than Attribute nodes;
//! - comments are always kept; processing instructions and DOCTYPE
//!   declarations are skipped.

mod input;
mod scan;

use tracing::debug;

use crate::error::ParseError;
use crate::options::XmlOptions;
use crate::tree::{Document, NodeId};

use scan::{ScanHandler, XmlDecl};

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] for ill-formed input and
/// [`ParseError::EmptyDocument`] for input with no root element.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &XmlOptions::default())
}

/// Parses an XML string with the given options.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] for ill-formed input and
/// [`ParseError::EmptyDocument`] for input with no root element.
pub fn parse_str_with_options(input: &str, options: &XmlOptions) -> Result<Document, ParseError> {
    debug!(len = input.len(), "parsing XML document");
    let mut builder = TreeBuilder::new(options.clone());
    scan::scan(input, &mut builder)?;
    Ok(builder.doc)
}

/// Builds a [`Document`] from scanner events.
struct TreeBuilder {
    doc: Document,
    /// Open-element stack. The bottom entry is the document node.
    stack: Vec<NodeId>,
    options: XmlOptions,
}

impl TreeBuilder {
    fn new(options: XmlOptions) -> Self {
        let doc = Document::new();
        let stack = vec![doc.root()];
        Self {
            doc,
            stack,
            options,
        }
    }

    fn top(&self) -> NodeId {
        // The stack always holds at least the document node.
        self.stack[self.stack.len() - 1]
    }
}

impl ScanHandler for TreeBuilder {
    fn xml_declaration(&mut self, decl: &XmlDecl) {
        self.doc.version = decl.version.clone();
        self.doc.encoding = decl.encoding.clone();
        self.doc.standalone = decl.standalone;
    }

    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) {
        let elem = self.doc.new_element(name);
        for (attr_name, attr_value) in attributes {
            if attr_name == "xmlns" {
                let ns = self.doc.new_namespace(None, attr_value);
                self.doc.add_namespace(elem, ns);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                let ns = self.doc.new_namespace(Some(prefix), attr_value);
                self.doc.add_namespace(elem, ns);
            } else {
                let attr = self.doc.new_attribute(attr_name, attr_value);
                self.doc.add_attribute(elem, attr);
            }
        }
        let parent = self.top();
        self.doc.append_child(parent, elem);
        self.stack.push(elem);
    }

    fn end_element(&mut self, _name: &str) {
        self.stack.pop();
    }

    fn characters(&mut self, content: &str) {
        let whitespace_only = content.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
        if whitespace_only && !self.options.preserve_whitespace {
            return;
        }
        let parent = self.top();
        let text = self.doc.new_text(content);
        self.doc.append_child(parent, text);
    }

    fn cdata(&mut self, content: &str) {
        // CDATA content is never subject to the whitespace policy.
        let parent = self.top();
        let text = if self.options.preserve_cdata {
            self.doc.new_cdata(content)
        } else {
            self.doc.new_text(content)
        };
        self.doc.append_child(parent, text);
    }

    fn comment(&mut self, content: &str) {
        let parent = self.top();
        let comment = self.doc.new_comment(content);
        self.doc.append_child(parent, comment);
    }
}
