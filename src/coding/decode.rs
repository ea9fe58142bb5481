//! The decode engine.
//!
//! A [`Decoder`] walks a parsed document with a stack of current-node
//! frames. Three views exist over the frame at the top of the stack:
//!
//! - the keyed view ([`KeyedDecoder`]) reads a record's fields by name,
//!   from child elements first and attributes second;
//! - the sequential view (inside [`KeyedDecoder::decode_sequence`]) walks
//!   same-named sibling elements, or a wrapped shape under a
//!   [`ContainerCoding::Sequence`] override;
//! - the single-value view ([`Decoder::decode_scalar`] and nested
//!   [`Decodable::decode`] calls) parses the frame's node itself.
//!
//! Absence of a required key is always an error here; optionality lives in
//! the record's own structural description via
//! [`KeyedDecoder::decode_optional`].

use std::collections::BTreeMap;

use tracing::trace;

use crate::tree::{Document, NodeId};

use super::scalar::Scalar;
use super::{CodingPath, ContainerCoding, DecodeOptions, Error, PathSegment};

/// A value that can be decoded from XML structure.
pub trait Decodable: Sized {
    /// Decodes a value from the decoder's current node.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error`] variants for missing keys,
    /// unparseable text, and corrupted leaf data.
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error>;

    /// The container-coding override for one of this type's fields, if
    /// any. Consulted by the keyed view's sequence and mapping decodes.
    fn field_coding(_field: &str) -> Option<ContainerCoding> {
        None
    }
}

/// Stack-based decoder over a parsed document.
///
/// Single-use: after an error the decoder's state is discard-only.
pub struct Decoder<'doc> {
    doc: &'doc Document,
    /// Current-node frames. Never empty; the bottom frame is the root
    /// element the decode started from.
    stack: Vec<NodeId>,
    path: CodingPath,
    options: DecodeOptions,
}

impl<'doc> Decoder<'doc> {
    pub(crate) fn new(doc: &'doc Document, root: NodeId, options: DecodeOptions) -> Self {
        Self {
            doc,
            stack: vec![root],
            path: CodingPath::default(),
            options,
        }
    }

    fn top(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    /// The options this decode runs under.
    #[must_use]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The structural path to the current node.
    #[must_use]
    pub fn path(&self) -> &CodingPath {
        &self.path
    }

    /// The derived string value of the current node.
    #[must_use]
    pub fn text(&self) -> String {
        self.doc.string_value(self.top())
    }

    /// Opens a keyed view over the current node, using `T`'s field-coding
    /// overrides.
    pub fn keyed<T: Decodable>(&mut self) -> KeyedDecoder<'_, 'doc> {
        KeyedDecoder {
            coding: T::field_coding,
            decoder: self,
        }
    }

    /// Parses the current node's derived text as a scalar.
    ///
    /// When a float substitution is configured, its three sentinel strings
    /// take precedence over ordinary float parsing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when the text does not parse.
    pub fn decode_scalar<T: Scalar>(&mut self) -> Result<T, Error> {
        let text = self.text();
        if let Some(sub) = &self.options.float_substitution {
            if let Some(class) = sub.class_of(&text) {
                if let Some(value) = T::from_nonfinite(class) {
                    return Ok(value);
                }
            }
        }
        T::parse_scalar(&text).ok_or_else(|| self.type_mismatch(T::KIND.name(), &text))
    }

    /// Builds a [`Error::TypeMismatch`] at the current path.
    #[must_use]
    pub fn type_mismatch(&self, expected: &str, found: &str) -> Error {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            path: self.path.clone(),
        }
    }

    /// Builds a [`Error::DataCorrupted`] at the current path.
    #[must_use]
    pub fn data_corrupted(&self, detail: impl Into<String>) -> Error {
        Error::DataCorrupted {
            detail: detail.into(),
            path: self.path.clone(),
        }
    }

    /// Builds a [`Error::KeyNotFound`] at the current path.
    #[must_use]
    pub fn key_not_found(&self, key: &str) -> Error {
        Error::KeyNotFound {
            key: key.to_string(),
            path: self.path.clone(),
        }
    }

    /// Runs `f` with `node` pushed as the current frame, restoring the
    /// stack and path afterwards.
    fn with_node<T>(
        &mut self,
        node: NodeId,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.stack.push(node);
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        self.stack.pop();
        result
    }
}

/// Cursor over a fixed list of element nodes.
struct SequenceFrame {
    elements: Vec<NodeId>,
    cursor: usize,
}

impl SequenceFrame {
    fn new(elements: Vec<NodeId>) -> Self {
        Self {
            elements,
            cursor: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.elements.len()
    }

    fn next(&mut self) -> Option<(usize, NodeId)> {
        let index = self.cursor;
        let node = self.elements.get(index).copied()?;
        self.cursor += 1;
        Some((index, node))
    }
}

/// Keyed view over the decoder's current node.
pub struct KeyedDecoder<'a, 'doc> {
    decoder: &'a mut Decoder<'doc>,
    coding: fn(&str) -> Option<ContainerCoding>,
}

impl<'a, 'doc> KeyedDecoder<'a, 'doc> {
    fn doc(&self) -> &'doc Document {
        self.decoder.doc
    }

    fn node(&self) -> NodeId {
        self.decoder.top()
    }

    /// Whether `key` is present as a child element or an attribute.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.resolve(key).is_some()
    }

    /// Child elements take precedence over attributes.
    fn resolve(&self, key: &str) -> Option<NodeId> {
        let doc = self.doc();
        let node = self.node();
        doc.elements(node, key)
            .next()
            .or_else(|| doc.attribute(node, key))
    }

    /// Decodes a required field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when `key` is present as neither a
    /// child element nor an attribute, plus `T`'s own decode errors.
    pub fn decode<T: Decodable>(&mut self, key: &str) -> Result<T, Error> {
        trace!(key, "decoding field");
        let node = self
            .resolve(key)
            .ok_or_else(|| self.decoder.key_not_found(key))?;
        self.decoder
            .with_node(node, PathSegment::Key(key.to_string()), T::decode)
    }

    /// Decodes an optional field: `None` when `key` is absent.
    ///
    /// # Errors
    ///
    /// Returns `T`'s decode errors when the key is present but malformed.
    pub fn decode_optional<T: Decodable>(&mut self, key: &str) -> Result<Option<T>, Error> {
        if self.contains(key) {
            self.decode(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Decodes a sequence field.
    ///
    /// Without an override, same-named sibling elements are the items and
    /// zero matches yield an empty vector. With a
    /// [`ContainerCoding::Sequence`] override, the field-named wrapper
    /// element is required and its entry-named children are the items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] for a missing wrapper in wrapped
    /// mode, plus `T`'s own decode errors.
    pub fn decode_sequence<T: Decodable>(&mut self, key: &str) -> Result<Vec<T>, Error> {
        let doc = self.doc();
        let node = self.node();
        match (self.coding)(key) {
            Some(ContainerCoding::Sequence { entry }) => {
                let wrapper = doc
                    .elements(node, key)
                    .next()
                    .ok_or_else(|| self.decoder.key_not_found(key))?;
                let elements: Vec<NodeId> = doc.elements(wrapper, entry).collect();
                self.decoder
                    .with_node(wrapper, PathSegment::Key(key.to_string()), |decoder| {
                        decode_items(decoder, elements)
                    })
            }
            _ => {
                let elements: Vec<NodeId> = doc.elements(node, key).collect();
                self.decoder.path.push(PathSegment::Key(key.to_string()));
                let result = decode_items(self.decoder, elements);
                self.decoder.path.pop();
                result
            }
        }
    }

    /// Decodes a mapping field.
    ///
    /// Without an override, the field-named wrapper's child element
    /// *names* are the keys. With a [`ContainerCoding::Mapping`] override,
    /// entries are explicit key/value elements, either per-entry wrapped
    /// or flat (see [`ContainerCoding`]; flat mode pairs key and value
    /// children positionally).
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when the field element is missing,
    /// [`Error::TypeMismatch`] for unparseable keys, and
    /// [`Error::DataCorrupted`] for unpaired flat-mode children, plus
    /// `V`'s own decode errors.
    pub fn decode_map<K, V>(&mut self, key: &str) -> Result<BTreeMap<K, V>, Error>
    where
        K: Scalar + Ord,
        V: Decodable,
    {
        let doc = self.doc();
        let node = self.node();
        let wrapper = doc
            .elements(node, key)
            .next()
            .ok_or_else(|| self.decoder.key_not_found(key))?;
        let coding = (self.coding)(key);
        self.decoder
            .with_node(wrapper, PathSegment::Key(key.to_string()), |decoder| {
                match coding {
                    Some(ContainerCoding::Mapping {
                        entry: Some(entry),
                        key: key_name,
                        value: value_name,
                    }) => decode_entry_map(decoder, wrapper, entry, key_name, value_name),
                    Some(ContainerCoding::Mapping {
                        entry: None,
                        key: key_name,
                        value: value_name,
                    }) => decode_flat_map(decoder, wrapper, key_name, value_name),
                    _ => decode_named_map(decoder, wrapper),
                }
            })
    }
}

fn decode_items<T: Decodable>(
    decoder: &mut Decoder<'_>,
    elements: Vec<NodeId>,
) -> Result<Vec<T>, Error> {
    let mut frame = SequenceFrame::new(elements);
    let mut items = Vec::with_capacity(frame.elements.len());
    while !frame.is_at_end() {
        let Some((index, node)) = frame.next() else {
            break;
        };
        let item = decoder.with_node(node, PathSegment::Index(index), T::decode)?;
        items.push(item);
    }
    Ok(items)
}

/// Default mapping shape: child element names are the keys.
fn decode_named_map<K, V>(decoder: &mut Decoder<'_>, wrapper: NodeId) -> Result<BTreeMap<K, V>, Error>
where
    K: Scalar + Ord,
    V: Decodable,
{
    let doc = decoder.doc;
    let mut map = BTreeMap::new();
    for child in child_elements(doc, wrapper) {
        let name = doc.name(child).unwrap_or_default().to_string();
        let map_key = K::parse_scalar(&name)
            .ok_or_else(|| decoder.type_mismatch(K::KIND.name(), &name))?;
        let value = decoder.with_node(child, PathSegment::Key(name), V::decode)?;
        map.insert(map_key, value);
    }
    Ok(map)
}

/// Entry-wrapped mapping shape: one `entry` element per map entry, each
/// holding a key-named and a value-named child.
fn decode_entry_map<K, V>(
    decoder: &mut Decoder<'_>,
    wrapper: NodeId,
    entry: &str,
    key_name: &str,
    value_name: &str,
) -> Result<BTreeMap<K, V>, Error>
where
    K: Scalar + Ord,
    V: Decodable,
{
    let doc = decoder.doc;
    let entries: Vec<NodeId> = doc.elements(wrapper, entry).collect();
    let mut map = BTreeMap::new();
    for (index, entry_node) in entries.into_iter().enumerate() {
        let (map_key, value) =
            decoder.with_node(entry_node, PathSegment::Index(index), |decoder| {
                let key_node = decoder
                    .doc
                    .elements(entry_node, key_name)
                    .next()
                    .ok_or_else(|| decoder.key_not_found(key_name))?;
                let key_text = decoder.doc.string_value(key_node);
                let map_key = K::parse_scalar(&key_text)
                    .ok_or_else(|| decoder.type_mismatch(K::KIND.name(), &key_text))?;
                let value_node = decoder
                    .doc
                    .elements(entry_node, value_name)
                    .next()
                    .ok_or_else(|| decoder.key_not_found(value_name))?;
                let value = decoder.with_node(
                    value_node,
                    PathSegment::Key(value_name.to_string()),
                    V::decode,
                )?;
                Ok((map_key, value))
            })?;
        map.insert(map_key, value);
    }
    Ok(map)
}

/// Flat mapping shape: key and value children sit directly under the
/// wrapper, paired positionally. Only unambiguous for a single entry.
fn decode_flat_map<K, V>(
    decoder: &mut Decoder<'_>,
    wrapper: NodeId,
    key_name: &str,
    value_name: &str,
) -> Result<BTreeMap<K, V>, Error>
where
    K: Scalar + Ord,
    V: Decodable,
{
    let doc = decoder.doc;
    let keys: Vec<NodeId> = doc.elements(wrapper, key_name).collect();
    let values: Vec<NodeId> = doc.elements(wrapper, value_name).collect();
    if keys.len() != values.len() {
        return Err(decoder.data_corrupted(format!(
            "unpaired flat map children: {} '{key_name}' vs {} '{value_name}'",
            keys.len(),
            values.len()
        )));
    }
    let mut map = BTreeMap::new();
    for (index, (key_node, value_node)) in keys.into_iter().zip(values).enumerate() {
        let key_text = doc.string_value(key_node);
        let map_key = K::parse_scalar(&key_text)
            .ok_or_else(|| decoder.type_mismatch(K::KIND.name(), &key_text))?;
        let value = decoder.with_node(value_node, PathSegment::Index(index), V::decode)?;
        map.insert(map_key, value);
    }
    Ok(map)
}

fn child_elements(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.children(node)
        .iter()
        .copied()
        .filter(|&c| doc.kind(c) == crate::tree::NodeKind::Element)
        .collect()
}
