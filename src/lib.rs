//! # xmlbind
//!
//! An in-memory XML document tree with a streaming parser, a configurable
//! string serializer, and a typed encode/decode layer that maps structured
//! values (records, sequences, mappings, scalars) onto XML and back.
//!
//! ## Quick Start
//!
//! ```
//! use xmlbind::Document;
//!
//! let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.name(root), Some("root"));
//! ```
//!
//! Typed values travel through the [`coding`] module:
//!
//! ```
//! use xmlbind::coding::{self, Decodable, Decoder, Error};
//!
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
//! let p: Point = coding::from_str("<Point><x>3</x><y>-4</y></Point>").unwrap();
//! assert_eq!((p.x, p.y), (3, -4));
//! ```

pub mod coding;
pub mod encoding;
pub mod error;
mod options;
pub mod parser;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use error::ParseError;
pub use options::XmlOptions;
pub use tree::{Document, NodeId, NodeKind};
