//! The encode engine.
//!
//! An [`Encoder`] mirrors the decode engine with a stack of
//! under-construction element frames. Nested encodes run under a scoped
//! frame: the child element is created, pushed, filled by a closure, then
//! popped and appended to its parent on every exit path, including error
//! paths, so a failed encode never leaks a dangling frame.

use tracing::trace;

use crate::tree::{Document, NodeId};

use super::scalar::Scalar;
use super::{CodingPath, ContainerCoding, EncodeOptions, Error, PathSegment};

/// A value that can be encoded into XML structure.
pub trait Encodable {
    /// Encodes the value into the encoder's current element.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error`] variants, notably
    /// [`Error::InvalidFloatValue`] for unsubstituted non-finite floats.
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error>;

    /// The container-coding override for one of this type's fields, if
    /// any. Consulted by the keyed view's sequence and mapping encodes.
    fn field_coding(_field: &str) -> Option<ContainerCoding> {
        None
    }
}

/// Stack-based encoder building a document.
///
/// Single-use: after an error the encoder's state is discard-only.
pub struct Encoder {
    doc: Document,
    /// Element-under-construction frames. Never empty; the bottom frame is
    /// the root element.
    stack: Vec<NodeId>,
    path: CodingPath,
    options: EncodeOptions,
}

impl Encoder {
    pub(crate) fn new(root_name: &str, options: EncodeOptions) -> Self {
        let mut doc = Document::new();
        let root = doc.new_element(root_name);
        let doc_node = doc.root();
        doc.append_child(doc_node, root);
        Self {
            doc,
            stack: vec![root],
            path: CodingPath::default(),
            options,
        }
    }

    pub(crate) fn into_document(self) -> Document {
        self.doc
    }

    fn top(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    /// The options this encode runs under.
    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// The structural path to the current element.
    #[must_use]
    pub fn path(&self) -> &CodingPath {
        &self.path
    }

    /// Opens a keyed view over the current element, using `T`'s
    /// field-coding overrides.
    pub fn keyed<T: Encodable>(&mut self) -> KeyedEncoder<'_> {
        KeyedEncoder {
            coding: T::field_coding,
            encoder: self,
        }
    }

    /// Sets the current element's derived string value.
    pub fn encode_text(&mut self, text: &str) {
        let top = self.top();
        self.doc.set_string_value(top, Some(text));
    }

    /// Formats a scalar into the current element's string value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFloatValue`] for a non-finite float when no
    /// substitution is configured.
    pub fn encode_scalar<T: Scalar>(&mut self, value: &T) -> Result<(), Error> {
        if let Some(class) = value.nonfinite() {
            let Some(sub) = &self.options.float_substitution else {
                return Err(Error::InvalidFloatValue {
                    value: value.format_scalar(),
                });
            };
            let text = sub.for_class(class).to_string();
            self.encode_text(&text);
            return Ok(());
        }
        let text = value.format_scalar();
        self.encode_text(&text);
        Ok(())
    }

    /// Runs `f` against a fresh element named `name` pushed as the current
    /// frame. The element is appended to its parent when the frame closes,
    /// whether `f` succeeded or not.
    pub fn encode_element<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.scoped(name, PathSegment::Key(name.to_string()), f)
    }

    fn scoped<T>(
        &mut self,
        name: &str,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let parent = self.top();
        let child = self.doc.new_element(name);
        self.stack.push(child);
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        self.stack.pop();
        self.doc.append_child(parent, child);
        result
    }
}

/// Keyed view over the encoder's current element.
pub struct KeyedEncoder<'a> {
    encoder: &'a mut Encoder,
    coding: fn(&str) -> Option<ContainerCoding>,
}

impl<'a> KeyedEncoder<'a> {
    /// Encodes a field into a new child element named `key`.
    ///
    /// # Errors
    ///
    /// Returns `T`'s encode errors.
    pub fn encode<T: Encodable + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), Error> {
        trace!(key, "encoding field");
        self.encoder
            .scoped(key, PathSegment::Key(key.to_string()), |encoder| {
                value.encode(encoder)
            })
    }

    /// Encodes an optional field; `None` emits nothing.
    ///
    /// # Errors
    ///
    /// Returns `T`'s encode errors.
    pub fn encode_optional<T: Encodable>(
        &mut self,
        key: &str,
        value: &Option<T>,
    ) -> Result<(), Error> {
        match value {
            Some(v) => self.encode(key, v),
            None => Ok(()),
        }
    }

    /// Encodes a sequence field.
    ///
    /// Without an override, each item becomes a `key`-named sibling under
    /// the current element (the unwrapped repeated-sibling shape). With a
    /// [`ContainerCoding::Sequence`] override, one `key`-named wrapper
    /// holds an entry-named child per item.
    ///
    /// # Errors
    ///
    /// Returns `T`'s encode errors.
    pub fn encode_sequence<T: Encodable>(&mut self, key: &str, items: &[T]) -> Result<(), Error> {
        match (self.coding)(key) {
            Some(ContainerCoding::Sequence { entry }) => self.encoder.scoped(
                key,
                PathSegment::Key(key.to_string()),
                |encoder| {
                    for (index, item) in items.iter().enumerate() {
                        encoder.scoped(entry, PathSegment::Index(index), |encoder| {
                            item.encode(encoder)
                        })?;
                    }
                    Ok(())
                },
            ),
            _ => {
                self.encoder.path.push(PathSegment::Key(key.to_string()));
                let mut result = Ok(());
                for (index, item) in items.iter().enumerate() {
                    result = self.encoder.scoped(key, PathSegment::Index(index), |encoder| {
                        item.encode(encoder)
                    });
                    if result.is_err() {
                        break;
                    }
                }
                self.encoder.path.pop();
                result
            }
        }
    }

    /// Encodes a mapping field.
    ///
    /// Without an override, each entry becomes a child element *named* for
    /// its key. With a [`ContainerCoding::Mapping`] override, entries are
    /// explicit key/value elements, either per-entry wrapped or flat (flat
    /// mode emits indistinguishable sibling pairs and only round-trips
    /// unambiguously for maps of at most one entry).
    ///
    /// # Errors
    ///
    /// Returns `V`'s encode errors.
    pub fn encode_map<K, V>(
        &mut self,
        key: &str,
        map: &std::collections::BTreeMap<K, V>,
    ) -> Result<(), Error>
    where
        K: Scalar + Ord,
        V: Encodable,
    {
        let coding = (self.coding)(key);
        self.encoder
            .scoped(key, PathSegment::Key(key.to_string()), |encoder| {
                match coding {
                    Some(ContainerCoding::Mapping {
                        entry: Some(entry),
                        key: key_name,
                        value: value_name,
                    }) => {
                        for (index, (map_key, value)) in map.iter().enumerate() {
                            encoder.scoped(entry, PathSegment::Index(index), |encoder| {
                                encoder.scoped(
                                    key_name,
                                    PathSegment::Key(key_name.to_string()),
                                    |encoder| {
                                        encoder.encode_text(&map_key.format_scalar());
                                        Ok(())
                                    },
                                )?;
                                encoder.scoped(
                                    value_name,
                                    PathSegment::Key(value_name.to_string()),
                                    |encoder| value.encode(encoder),
                                )
                            })?;
                        }
                        Ok(())
                    }
                    Some(ContainerCoding::Mapping {
                        entry: None,
                        key: key_name,
                        value: value_name,
                    }) => {
                        for (map_key, value) in map {
                            encoder.scoped(
                                key_name,
                                PathSegment::Key(key_name.to_string()),
                                |encoder| {
                                    encoder.encode_text(&map_key.format_scalar());
                                    Ok(())
                                },
                            )?;
                            encoder.scoped(
                                value_name,
                                PathSegment::Key(value_name.to_string()),
                                |encoder| value.encode(encoder),
                            )?;
                        }
                        Ok(())
                    }
                    _ => {
                        for (map_key, value) in map {
                            let name = map_key.format_scalar();
                            encoder.scoped(&name, PathSegment::Key(name.clone()), |encoder| {
                                value.encode(encoder)
                            })?;
                        }
                        Ok(())
                    }
                }
            })
    }
}
