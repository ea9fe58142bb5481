//! Node kind definitions.
//!
//! The `NodeKind` enum tags each node in the arena with one of the six node
//! types in the data model. Per-kind payloads (name, string value, rendering
//! flags) and navigation links live in `NodeData`, not here, because every
//! kind shares the same optional-name/optional-value shape.

/// The kind of an XML node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document node — there is exactly one per `Document`, and it owns
    /// exactly one root `Element` at a time.
    Document,
    /// An element node, e.g., `<item id="1">`.
    Element,
    /// A text node containing character data.
    Text,
    /// An attribute node. Owned by an element's attribute list, never by the
    /// generic child list.
    Attribute,
    /// A namespace declaration node. An absent name denotes the default
    /// namespace (`xmlns="..."`).
    Namespace,
    /// A comment node, e.g., `<!-- ... -->`.
    Comment,
}

impl NodeKind {
    /// Whether this kind may appear in an element's generic child list.
    ///
    /// Attribute and Namespace nodes live in their own per-element lists,
    /// and a Document can never be a child of anything.
    #[must_use]
    pub fn is_child_kind(self) -> bool {
        matches!(self, Self::Element | Self::Text | Self::Comment)
    }
}
