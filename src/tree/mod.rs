//! Arena-based XML document tree.
//!
//! This module implements the core tree representation using arena allocation
//! with typed indices. All nodes live in a contiguous `Vec<NodeData>` owned by
//! the `Document`, and are referenced by `NodeId` — a newtype over `NonZeroU32`.
//!
//! The parent link is a non-owning arena index, never counted in ownership:
//! a node belongs to exactly one owning collection at a time (a parent's
//! child list, or an element's attribute or namespace list), and `detach`
//! removes it from that collection and clears the back-reference. This
//! discipline makes reference cycles impossible without any reference
//! counting.

mod node;

pub use node::NodeKind;

use std::num::NonZeroU32;

use crate::error::ParseError;
use crate::options::XmlOptions;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
///
/// Every node carries an optional name (required for elements and
/// attributes, optional for namespaces, absent for text and comments), an
/// optional string value, a CDATA rendering flag, and a non-owning parent
/// back-reference. Elements additionally own three ordered collections:
/// the generic child list, the attribute list, and the namespace list.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// What kind of node this is.
    pub kind: NodeKind,
    /// The node's name. `None` on a Namespace node denotes the default
    /// namespace.
    pub name: Option<String>,
    /// The node's stored string value. For elements this field is unused:
    /// an element's string value is derived from its Text children (see
    /// [`Document::string_value`]).
    pub value: Option<String>,
    /// Render this Text node as a CDATA section when CDATA preservation is
    /// enabled.
    pub cdata: bool,
    /// Parent node, if attached. Non-owning.
    pub parent: Option<NodeId>,
    /// Ordered child list (Element/Text/Comment kinds only).
    children: Vec<NodeId>,
    /// Ordered attribute list (Attribute kind only; unique names).
    attributes: Vec<NodeId>,
    /// Ordered namespace list (Namespace kind only; unique names).
    namespaces: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, name: Option<String>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            cdata: false,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and provides methods for tree
/// navigation and mutation. All tree operations go through `&Document`
/// (navigation) or `&mut Document` (mutation); nothing is safe to mutate
/// concurrently.
///
/// # Examples
///
/// ```
/// use xmlbind::Document;
///
/// let doc = Document::parse_str("<root/>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.name(root), Some("root"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node id (not the root element).
    root: NodeId,
    /// XML version from the XML declaration (e.g., "1.0").
    pub version: Option<String>,
    /// Encoding from the XML declaration (e.g., "UTF-8").
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
}

impl Document {
    /// Creates a new empty document containing a single document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(16);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document, None, None));
        // Index 1: the document node
        nodes.push(NodeData::new(NodeKind::Document, None, None));
        let root = NodeId::from_index(1);
        Self {
            nodes,
            root,
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Parses an XML string into a `Document` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] if the input is not well-formed
    /// XML, or [`ParseError::EmptyDocument`] if it contains no root element.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        crate::parser::parse_str(input)
    }

    /// Parses an XML string into a `Document` with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] if the input is not well-formed
    /// XML, or [`ParseError::EmptyDocument`] if it contains no root element.
    pub fn parse_str_with_options(input: &str, options: &XmlOptions) -> Result<Self, ParseError> {
        crate::parser::parse_str_with_options(input, options)
    }

    /// Parses XML from raw bytes, detecting the encoding automatically.
    ///
    /// Uses BOM sniffing and XML declaration inspection to determine the
    /// encoding, then transcodes to UTF-8 before parsing. See
    /// [`crate::encoding::decode_to_utf8`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the encoding cannot be determined, the bytes
    /// cannot be transcoded, or the resulting XML is not well-formed.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        Self::parse_bytes_with_options(input, &XmlOptions::default())
    }

    /// Parses XML from raw bytes with the given options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the encoding cannot be determined, the bytes
    /// cannot be transcoded, or the resulting XML is not well-formed.
    pub fn parse_bytes_with_options(
        input: &[u8],
        options: &XmlOptions,
    ) -> Result<Self, ParseError> {
        let utf8 = crate::encoding::decode_to_utf8(input)
            .map_err(|e| ParseError::Encoding { message: e.message })?;
        let text = utf8.strip_prefix('\u{FEFF}').unwrap_or(&utf8);
        crate::parser::parse_str_with_options(text, options)
    }

    /// Renders the document to a string, per [`crate::serial::render`].
    #[must_use]
    pub fn render(&self, options: &XmlOptions) -> String {
        crate::serial::render(self, options)
    }

    // --- Factories ---

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(data);
        NodeId::from_index(index)
    }

    /// Creates a detached element node.
    pub fn new_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Element,
            Some(name.to_string()),
            None,
        ))
    }

    /// Creates a detached text node.
    pub fn new_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Text,
            None,
            Some(content.to_string()),
        ))
    }

    /// Creates a detached text node flagged for CDATA rendering.
    pub fn new_cdata(&mut self, content: &str) -> NodeId {
        let id = self.new_text(content);
        self.node_mut(id).cdata = true;
        id
    }

    /// Creates a detached attribute node.
    pub fn new_attribute(&mut self, name: &str, value: &str) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Attribute,
            Some(name.to_string()),
            Some(value.to_string()),
        ))
    }

    /// Creates a detached namespace node. A `None` prefix declares the
    /// default namespace.
    pub fn new_namespace(&mut self, prefix: Option<&str>, uri: &str) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Namespace,
            prefix.map(str::to_string),
            Some(uri.to_string()),
        ))
    }

    /// Creates a detached comment node.
    pub fn new_comment(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Comment,
            None,
            Some(content.to_string()),
        ))
    }

    // --- Access ---

    /// Returns the document node id (the Document node, not the root element).
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root element of the document, if one is attached.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| self.node(id).kind == NodeKind::Element)
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Returns the name of a node, if it has one.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).name.as_deref()
    }

    /// Returns the stored string value of a node, if any.
    ///
    /// For elements this is always `None`; use [`string_value`]
    /// (Document::string_value) for the derived text.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id).value.as_deref()
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the ordered child list of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns the ordered attribute list of a node.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).attributes
    }

    /// Returns the ordered namespace list of a node.
    #[must_use]
    pub fn namespaces(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).namespaces
    }

    /// Returns the child elements of `id` with the given name, in document
    /// order.
    pub fn elements<'a>(&'a self, id: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).iter().copied().filter(move |&c| {
            self.node(c).kind == NodeKind::Element && self.node(c).name.as_deref() == Some(name)
        })
    }

    /// Returns the attribute node with the given name, if present.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(id)
            .iter()
            .copied()
            .find(|&a| self.node(a).name.as_deref() == Some(name))
    }

    /// Returns the value of the attribute with the given name, if present.
    #[must_use]
    pub fn attribute_value(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute(id, name).and_then(|a| self.value(a))
    }

    /// Returns the namespace node with the given prefix, if present.
    /// A `None` prefix matches the default namespace declaration.
    #[must_use]
    pub fn namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<NodeId> {
        self.namespaces(id)
            .iter()
            .copied()
            .find(|&n| self.node(n).name.as_deref() == prefix)
    }

    // --- Derived string value ---

    /// Returns the textual payload of a node.
    ///
    /// For an element this is derived, not stored: the concatenation of all
    /// direct Text children's values in order (empty if there are none).
    /// For every other kind it is the stored value.
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> String {
        if self.node(id).kind == NodeKind::Element {
            let mut out = String::new();
            for &child in self.children(id) {
                if self.node(child).kind == NodeKind::Text {
                    if let Some(v) = self.node(child).value.as_deref() {
                        out.push_str(v);
                    }
                }
            }
            out
        } else {
            self.node(id).value.clone().unwrap_or_default()
        }
    }

    /// Sets the textual payload of a node.
    ///
    /// For an element this removes all direct Text children and, if `value`
    /// is `Some`, appends one new Text child holding it. For every other
    /// kind it replaces the stored value.
    pub fn set_string_value(&mut self, id: NodeId, value: Option<&str>) {
        if self.node(id).kind == NodeKind::Element {
            let texts: Vec<NodeId> = self
                .children(id)
                .iter()
                .copied()
                .filter(|&c| self.node(c).kind == NodeKind::Text)
                .collect();
            for t in texts {
                self.detach(t);
            }
            if let Some(v) = value {
                let text = self.new_text(v);
                self.append_child(id, text);
            }
        } else {
            self.node_mut(id).value = value.map(str::to_string);
        }
    }

    // --- Mutation ---

    /// Appends a child node to the end of a parent's child list.
    ///
    /// Appending an Element to the document node replaces any existing root
    /// element (a document owns exactly one root element at a time).
    ///
    /// # Panics
    ///
    /// Panics if `child` is an Attribute, Namespace, or Document node (those
    /// never appear in the generic child list), or if `child` is already
    /// attached. Detach it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.node(parent).children.len();
        self.insert_child(parent, child, index);
    }

    /// Inserts a child node at the given index in a parent's child list.
    /// An index past the end appends.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`append_child`]
    /// (Document::append_child).
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        assert!(
            self.node(child).kind.is_child_kind(),
            "attribute, namespace, and document nodes cannot be children"
        );
        assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );
        if self.node(parent).kind == NodeKind::Document && self.node(child).kind == NodeKind::Element
        {
            if let Some(prev_root) = self.root_element() {
                self.detach(prev_root);
            }
        }
        // Re-read: detaching the previous root may have shifted indices.
        let index = index.min(self.node(parent).children.len());
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
    }

    /// Atomically replaces a node's child list, updating parent pointers on
    /// both the removed and inserted sets.
    ///
    /// # Panics
    ///
    /// Panics if any inserted node is of a non-child kind or is already
    /// attached elsewhere.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let old = std::mem::take(&mut self.node_mut(parent).children);
        for id in old {
            self.node_mut(id).parent = None;
        }
        for &id in &children {
            assert!(
                self.node(id).kind.is_child_kind(),
                "attribute, namespace, and document nodes cannot be children"
            );
            assert!(
                self.node(id).parent.is_none(),
                "child already has a parent; detach it first"
            );
            self.node_mut(id).parent = Some(parent);
        }
        self.node_mut(parent).children = children;
    }

    /// Adds an attribute node to an element's attribute list.
    ///
    /// If the element already has an attribute with the same name, the
    /// existing one is detached first (insertion replaces).
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an Element, `attr` is not an Attribute,
    /// or `attr` is already attached.
    pub fn add_attribute(&mut self, element: NodeId, attr: NodeId) {
        assert!(
            self.node(element).kind == NodeKind::Element,
            "attributes can only be added to elements"
        );
        assert!(
            self.node(attr).kind == NodeKind::Attribute,
            "add_attribute requires an Attribute node"
        );
        assert!(
            self.node(attr).parent.is_none(),
            "attribute already has a parent; detach it first"
        );
        if let Some(name) = self.node(attr).name.clone() {
            if let Some(existing) = self.attribute(element, &name) {
                self.detach(existing);
            }
        }
        self.node_mut(attr).parent = Some(element);
        self.node_mut(element).attributes.push(attr);
    }

    /// Atomically replaces an element's attribute list.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`add_attribute`]
    /// (Document::add_attribute).
    pub fn set_attributes(&mut self, element: NodeId, attrs: Vec<NodeId>) {
        let old = std::mem::take(&mut self.node_mut(element).attributes);
        for id in old {
            self.node_mut(id).parent = None;
        }
        for attr in attrs {
            self.add_attribute(element, attr);
        }
    }

    /// Adds a namespace node to an element's namespace list.
    ///
    /// If the element already declares a namespace with the same prefix
    /// (including the `None` default-namespace prefix), the existing one is
    /// detached first.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an Element, `ns` is not a Namespace, or
    /// `ns` is already attached.
    pub fn add_namespace(&mut self, element: NodeId, ns: NodeId) {
        assert!(
            self.node(element).kind == NodeKind::Element,
            "namespaces can only be added to elements"
        );
        assert!(
            self.node(ns).kind == NodeKind::Namespace,
            "add_namespace requires a Namespace node"
        );
        assert!(
            self.node(ns).parent.is_none(),
            "namespace already has a parent; detach it first"
        );
        let prefix = self.node(ns).name.clone();
        if let Some(existing) = self.namespace(element, prefix.as_deref()) {
            self.detach(existing);
        }
        self.node_mut(ns).parent = Some(element);
        self.node_mut(element).namespaces.push(ns);
    }

    /// Atomically replaces an element's namespace list.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`add_namespace`]
    /// (Document::add_namespace).
    pub fn set_namespaces(&mut self, element: NodeId, namespaces: Vec<NodeId>) {
        let old = std::mem::take(&mut self.node_mut(element).namespaces);
        for id in old {
            self.node_mut(id).parent = None;
        }
        for ns in namespaces {
            self.add_namespace(element, ns);
        }
    }

    /// Detaches a node from its owning collection and clears its parent
    /// back-reference. A no-op for already-detached nodes.
    ///
    /// The node remains allocated in the arena and may be re-attached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let kind = self.node(id).kind;
        let list = match kind {
            NodeKind::Attribute => &mut self.node_mut(parent).attributes,
            NodeKind::Namespace => &mut self.node_mut(parent).namespaces,
            _ => &mut self.node_mut(parent).children,
        };
        if let Some(pos) = list.iter().position(|&n| n == id) {
            list.remove(pos);
        }
        self.node_mut(id).parent = None;
    }

    /// Returns the total number of nodes in the arena (excluding the
    /// placeholder).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
