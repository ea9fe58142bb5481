//! Parse error types with source location tracking.
//!
//! Errors carry line, column, and byte offset information for precise
//! diagnostics. A document with no root element is reported as a distinct
//! condition rather than as malformed markup, so callers can tell an empty
//! input apart from a broken one.

use std::fmt;

use thiserror::Error;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is not well-formed XML.
    #[error("malformed XML at {location}: {message}")]
    Malformed {
        /// Human-readable description of what went wrong.
        message: String,
        /// Where in the source the error occurred.
        location: SourceLocation,
    },

    /// The input bytes could not be decoded into text.
    #[error("encoding error: {message}")]
    Encoding {
        /// Human-readable description of the decoding failure.
        message: String,
    },

    /// The input contains no root element.
    #[error("document contains no root element")]
    EmptyDocument,
}
