//! Typed encode/decode between structured values and XML documents.
//!
//! Values describe their own structure by implementing [`Decodable`] and
//! [`Encodable`]. A record implementation opens a keyed view over the
//! current element and reads or writes its fields by name; sequences and
//! mappings go through the keyed view's dedicated methods, whose XML shape
//! can be customized per field with a [`ContainerCoding`] override.
//!
//! Well-known leaf types get specialized handling ahead of generic
//! structural coding: timestamps ([`chrono::DateTime<Utc>`]), binary blobs
//! ([`Data`]), and URIs ([`url::Url`]), each with a selectable strategy.
//!
//! Engines are single-use: after an error the engine's stack and any
//! partially built tree are in a discard-only state.
//!
//! # Examples
//!
//! ```
//! use xmlbind::coding::{self, Decodable, Decoder, Encodable, Encoder, Error};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Decodable for Point {
//!     fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
//!         let mut keyed = decoder.keyed::<Self>();
//!         Ok(Point {
//!             x: keyed.decode("x")?,
//!             y: keyed.decode("y")?,
//!         })
//!     }
//! }
//!
//! impl Encodable for Point {
//!     fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
//!         let mut keyed = encoder.keyed::<Self>();
//!         keyed.encode("x", &self.x)?;
//!         keyed.encode("y", &self.y)
//!     }
//! }
//!
//! let p = Point { x: 3, y: -4 };
//! let text = coding::to_string(&p, "Point").unwrap();
//! let back: Point = coding::from_str(&text).unwrap();
//! assert_eq!(back, p);
//! ```

mod decode;
mod encode;
mod scalar;

pub use decode::{Decodable, Decoder, KeyedDecoder};
pub use encode::{Encodable, Encoder, KeyedEncoder};
pub use scalar::{NonFinite, Scalar, ScalarKind};

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error as ThisError;
use tracing::debug;
use url::Url;

use crate::error::ParseError;
use crate::options::XmlOptions;
use crate::tree::Document;

/// One step of the structural path from the root value to the current
/// coding position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A keyed-container field name.
    Key(String),
    /// A sequential-container index.
    Index(usize),
}

/// The structural path taken to reach a coding position, carried on every
/// decode/encode error for diagnosability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingPath {
    segments: Vec<PathSegment>,
}

impl CodingPath {
    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    /// The path segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Per-field override of a sequence or mapping's XML shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCoding {
    /// Wrap the sequence in a field-named element holding one `entry`-named
    /// child per item, instead of unwrapped repeated siblings.
    Sequence {
        /// Element name for each item.
        entry: &'static str,
    },
    /// Shape a mapping as explicit key/value elements instead of the
    /// default name-as-key form.
    Mapping {
        /// Element name wrapping each entry. `None` selects flat mode:
        /// key/value children sit directly under the field element with no
        /// per-entry wrapper. Flat mode is positionally paired on decode
        /// and is only unambiguous for maps of at most one entry.
        entry: Option<&'static str>,
        /// Element name of each entry's key.
        key: &'static str,
        /// Element name of each entry's value.
        value: &'static str,
    },
}

/// The error type for typed decode and encode.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A required field was present as neither a child element nor an
    /// attribute.
    #[error("key '{key}' not found at {path}")]
    KeyNotFound {
        /// The missing field name.
        key: String,
        /// Structural path to the containing record.
        path: CodingPath,
    },

    /// Derived text could not be parsed as the requested type.
    #[error("type mismatch at {path}: expected {expected}, found '{found}'")]
    TypeMismatch {
        /// What the decode expected, e.g. "integer".
        expected: String,
        /// The text actually found.
        found: String,
        /// Structural path to the failing value.
        path: CodingPath,
    },

    /// A well-known leaf type's text failed strategy-specific validation.
    #[error("data corrupted at {path}: {detail}")]
    DataCorrupted {
        /// What failed, e.g. "invalid base64".
        detail: String,
        /// Structural path to the failing value.
        path: CodingPath,
    },

    /// A non-finite float was encoded without a substitution strategy.
    #[error("non-finite floating-point value '{value}' has no substitution")]
    InvalidFloatValue {
        /// The formatted offending value.
        value: String,
    },

    /// The document contains no root element to decode from.
    #[error("document contains no root element")]
    EmptyDocument,

    /// The input failed to parse as XML.
    #[error(transparent)]
    Parse(ParseError),
}

fn lift_parse(e: ParseError) -> Error {
    match e {
        ParseError::EmptyDocument => Error::EmptyDocument,
        other => Error::Parse(other),
    }
}

/// Replacement strings for the three non-finite float classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatSubstitution {
    pub positive_infinity: String,
    pub negative_infinity: String,
    pub nan: String,
}

impl FloatSubstitution {
    pub(crate) fn for_class(&self, class: NonFinite) -> &str {
        match class {
            NonFinite::PositiveInfinity => &self.positive_infinity,
            NonFinite::NegativeInfinity => &self.negative_infinity,
            NonFinite::Nan => &self.nan,
        }
    }

    pub(crate) fn class_of(&self, text: &str) -> Option<NonFinite> {
        if text == self.positive_infinity {
            Some(NonFinite::PositiveInfinity)
        } else if text == self.negative_infinity {
            Some(NonFinite::NegativeInfinity)
        } else if text == self.nan {
            Some(NonFinite::Nan)
        } else {
            None
        }
    }
}

/// How timestamp text decodes into a [`DateTime<Utc>`].
#[derive(Clone, Default)]
pub enum TimestampDecoding {
    /// Decimal seconds since the Unix epoch.
    SecondsSince1970,
    /// Decimal milliseconds since the Unix epoch.
    MillisecondsSince1970,
    /// RFC 3339 / ISO 8601 text.
    #[default]
    Iso8601,
    /// Caller-supplied conversion against the active decode context.
    Custom(Arc<dyn Fn(&mut Decoder<'_>) -> Result<DateTime<Utc>, Error> + Send + Sync>),
}

impl fmt::Debug for TimestampDecoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecondsSince1970 => f.write_str("SecondsSince1970"),
            Self::MillisecondsSince1970 => f.write_str("MillisecondsSince1970"),
            Self::Iso8601 => f.write_str("Iso8601"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How a [`DateTime<Utc>`] encodes into timestamp text.
#[derive(Clone, Default)]
pub enum TimestampEncoding {
    /// Decimal seconds since the Unix epoch.
    SecondsSince1970,
    /// Decimal milliseconds since the Unix epoch.
    MillisecondsSince1970,
    /// RFC 3339 / ISO 8601 text.
    #[default]
    Iso8601,
    /// Caller-supplied conversion against the active encode context. The
    /// function may build arbitrary sub-structure instead of plain text.
    Custom(Arc<dyn Fn(&DateTime<Utc>, &mut Encoder) -> Result<(), Error> + Send + Sync>),
}

impl fmt::Debug for TimestampEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecondsSince1970 => f.write_str("SecondsSince1970"),
            Self::MillisecondsSince1970 => f.write_str("MillisecondsSince1970"),
            Self::Iso8601 => f.write_str("Iso8601"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How binary text decodes into [`Data`].
#[derive(Clone, Default)]
pub enum DataDecoding {
    /// Standard Base64 with padding.
    #[default]
    Base64,
    /// Caller-supplied conversion against the active decode context.
    Custom(Arc<dyn Fn(&mut Decoder<'_>) -> Result<Vec<u8>, Error> + Send + Sync>),
}

impl fmt::Debug for DataDecoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How [`Data`] encodes into text.
#[derive(Clone, Default)]
pub enum DataEncoding {
    /// Standard Base64 with padding.
    #[default]
    Base64,
    /// Caller-supplied conversion against the active encode context.
    Custom(Arc<dyn Fn(&[u8], &mut Encoder) -> Result<(), Error> + Send + Sync>),
}

impl fmt::Debug for DataEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options governing a decode run.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Timestamp strategy for `DateTime<Utc>` fields.
    pub timestamp: TimestampDecoding,
    /// Binary strategy for [`Data`] fields.
    pub data: DataDecoding,
    /// When set, these strings decode to the three non-finite float
    /// classes before ordinary float parsing runs.
    pub float_substitution: Option<FloatSubstitution>,
}

/// Options governing an encode run.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Timestamp strategy for `DateTime<Utc>` fields.
    pub timestamp: TimestampEncoding,
    /// Binary strategy for [`Data`] fields.
    pub data: DataEncoding,
    /// When set, non-finite floats encode as these strings instead of
    /// raising [`Error::InvalidFloatValue`].
    pub float_substitution: Option<FloatSubstitution>,
}

/// A binary blob with strategy-driven text representation (Base64 by
/// default).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data(pub Vec<u8>);

// --- Entry points ---

/// Decodes a value from XML text with default options.
///
/// # Errors
///
/// Returns [`Error::Parse`] or [`Error::EmptyDocument`] when the input is
/// not a well-formed document, and the decode errors of `T` otherwise.
pub fn from_str<T: Decodable>(input: &str) -> Result<T, Error> {
    from_str_with_options(input, &DecodeOptions::default())
}

/// Decodes a value from XML text.
///
/// # Errors
///
/// See [`from_str`].
pub fn from_str_with_options<T: Decodable>(
    input: &str,
    options: &DecodeOptions,
) -> Result<T, Error> {
    let doc = Document::parse_str(input).map_err(lift_parse)?;
    from_document_with_options(&doc, options)
}

/// Decodes a value from an already parsed document, starting at its root
/// element.
///
/// # Errors
///
/// Returns [`Error::EmptyDocument`] when the document has no root element,
/// and the decode errors of `T` otherwise.
pub fn from_document<T: Decodable>(doc: &Document) -> Result<T, Error> {
    from_document_with_options(doc, &DecodeOptions::default())
}

/// Decodes a value from an already parsed document.
///
/// # Errors
///
/// See [`from_document`].
pub fn from_document_with_options<T: Decodable>(
    doc: &Document,
    options: &DecodeOptions,
) -> Result<T, Error> {
    debug!("decoding document");
    let root = doc.root_element().ok_or(Error::EmptyDocument)?;
    let mut decoder = Decoder::new(doc, root, options.clone());
    T::decode(&mut decoder)
}

/// Encodes a value into a document whose root element is named
/// `root_name`, with default options.
///
/// # Errors
///
/// Returns the encode errors of `T`.
pub fn to_document<T: Encodable>(value: &T, root_name: &str) -> Result<Document, Error> {
    to_document_with_options(value, root_name, &EncodeOptions::default())
}

/// Encodes a value into a document whose root element is named
/// `root_name`.
///
/// # Errors
///
/// See [`to_document`].
pub fn to_document_with_options<T: Encodable>(
    value: &T,
    root_name: &str,
    options: &EncodeOptions,
) -> Result<Document, Error> {
    debug!(root = root_name, "encoding document");
    let mut encoder = Encoder::new(root_name, options.clone());
    value.encode(&mut encoder)?;
    Ok(encoder.into_document())
}

/// Encodes a value to XML text with default options.
///
/// # Errors
///
/// Returns the encode errors of `T`.
pub fn to_string<T: Encodable>(value: &T, root_name: &str) -> Result<String, Error> {
    to_string_with_options(value, root_name, &EncodeOptions::default())
}

/// Encodes a value to XML text.
///
/// # Errors
///
/// See [`to_string`].
pub fn to_string_with_options<T: Encodable>(
    value: &T,
    root_name: &str,
    options: &EncodeOptions,
) -> Result<String, Error> {
    let doc = to_document_with_options(value, root_name, options)?;
    Ok(doc.render(&XmlOptions::default()))
}

// --- Scalar impls ---

macro_rules! impl_scalar_coding {
    ($($t:ty),+) => {
        $(
            impl Decodable for $t {
                fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
                    decoder.decode_scalar()
                }
            }

            impl Encodable for $t {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.encode_scalar(self)
                }
            }
        )+
    };
}

impl_scalar_coding!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);

// --- Well-known leaf types ---

impl Decodable for DateTime<Utc> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let strategy = decoder.options().timestamp.clone();
        match strategy {
            TimestampDecoding::SecondsSince1970 => {
                let text = decoder.text();
                let secs: i64 = text.parse().map_err(|_| {
                    decoder.data_corrupted(format!("invalid epoch seconds '{text}'"))
                })?;
                DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| decoder.data_corrupted(format!("epoch seconds out of range: {secs}")))
            }
            TimestampDecoding::MillisecondsSince1970 => {
                let text = decoder.text();
                let millis: i64 = text.parse().map_err(|_| {
                    decoder.data_corrupted(format!("invalid epoch milliseconds '{text}'"))
                })?;
                DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    decoder.data_corrupted(format!("epoch milliseconds out of range: {millis}"))
                })
            }
            TimestampDecoding::Iso8601 => {
                let text = decoder.text();
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        decoder.data_corrupted(format!("invalid ISO-8601 timestamp '{text}': {e}"))
                    })
            }
            TimestampDecoding::Custom(f) => f(decoder),
        }
    }
}

impl Encodable for DateTime<Utc> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let strategy = encoder.options().timestamp.clone();
        match strategy {
            TimestampEncoding::SecondsSince1970 => {
                encoder.encode_text(&self.timestamp().to_string());
                Ok(())
            }
            TimestampEncoding::MillisecondsSince1970 => {
                encoder.encode_text(&self.timestamp_millis().to_string());
                Ok(())
            }
            TimestampEncoding::Iso8601 => {
                encoder.encode_text(&self.to_rfc3339_opts(SecondsFormat::Secs, true));
                Ok(())
            }
            TimestampEncoding::Custom(f) => f(self, encoder),
        }
    }
}

impl Decodable for Data {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let strategy = decoder.options().data.clone();
        match strategy {
            DataDecoding::Base64 => {
                let text = decoder.text();
                BASE64
                    .decode(text.trim())
                    .map(Data)
                    .map_err(|e| decoder.data_corrupted(format!("invalid base64: {e}")))
            }
            DataDecoding::Custom(f) => f(decoder).map(Data),
        }
    }
}

impl Encodable for Data {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let strategy = encoder.options().data.clone();
        match strategy {
            DataEncoding::Base64 => {
                encoder.encode_text(&BASE64.encode(&self.0));
                Ok(())
            }
            DataEncoding::Custom(f) => f(&self.0, encoder),
        }
    }
}

impl Decodable for Url {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let text = decoder.text();
        Url::parse(text.trim())
            .map_err(|e| decoder.data_corrupted(format!("invalid URI '{text}': {e}")))
    }
}

impl Encodable for Url {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_text(self.as_str());
        Ok(())
    }
}
