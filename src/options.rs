//! Document read/write options.
//!
//! A single option set is threaded through both the parser and the
//! serializer so that a document parsed under a given configuration can be
//! re-rendered symmetrically with the same configuration.

/// Options controlling how a document is parsed and rendered.
///
/// All flags default to `false` and are independently combinable. Use the
/// builder methods to configure:
///
/// ```
/// use xmlbind::XmlOptions;
///
/// let opts = XmlOptions::default()
///     .preserve_whitespace(true)
///     .compact_empty_elements(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlOptions {
    /// Render elements without children as self-closing tags (`<a/>`
    /// instead of `<a></a>`).
    pub compact_empty_elements: bool,
    /// Reserved for indented output. Currently a no-op.
    pub pretty_print: bool,
    /// Keep CDATA sections as CDATA: the parser tags them and the
    /// serializer re-emits `<![CDATA[...]]>` instead of escaped text.
    pub preserve_cdata: bool,
    /// Keep all character data, including whitespace-only runs and
    /// whitespace outside the root element, as text nodes.
    pub preserve_whitespace: bool,
}

impl XmlOptions {
    /// Enables or disables self-closing tags for empty elements.
    #[must_use]
    pub fn compact_empty_elements(mut self, yes: bool) -> Self {
        self.compact_empty_elements = yes;
        self
    }

    /// Enables or disables pretty-printed output (reserved, currently a no-op).
    #[must_use]
    pub fn pretty_print(mut self, yes: bool) -> Self {
        self.pretty_print = yes;
        self
    }

    /// Enables or disables CDATA preservation.
    #[must_use]
    pub fn preserve_cdata(mut self, yes: bool) -> Self {
        self.preserve_cdata = yes;
        self
    }

    /// Enables or disables whitespace preservation.
    #[must_use]
    pub fn preserve_whitespace(mut self, yes: bool) -> Self {
        self.preserve_whitespace = yes;
        self
    }
}
