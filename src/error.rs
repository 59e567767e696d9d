//! Error types for lap.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

use crate::io::VertexFormat;
use crate::mesh::Mode;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// An operation was invoked on a mesh in the wrong representation.
    ///
    /// `slice`, `flatten` and indexing need a flat mesh; unindexing needs an
    /// indexed one. This is a caller contract violation.
    #[error("{operation} requires a {expected} mesh, got {found}")]
    InvalidMode {
        /// The operation that was attempted.
        operation: &'static str,
        /// The mode the operation requires.
        expected: Mode,
        /// The mode the mesh was actually in.
        found: Mode,
    },

    /// A group range extends past the end of the array it describes.
    #[error("group '{name}' [{start}, {end}) exceeds array of length {len}")]
    GroupOutOfRange {
        /// The group name.
        name: String,
        /// First element of the group.
        start: u32,
        /// One past the last element of the group.
        end: u64,
        /// Length of the array the group was applied to.
        len: usize,
    },

    /// An index array entry does not name a palette vertex.
    #[error("index {index} at corner {corner} is out of range for {len} vertices")]
    IndexOutOfRange {
        /// Position in the index array.
        corner: usize,
        /// The offending index.
        index: u32,
        /// Number of palette vertices.
        len: usize,
    },

    /// A face-index stream does not match the attribute arrays it references.
    #[error("face index {index} at component {component} exceeds {attribute} array of length {len}")]
    InvalidFaceIndex {
        /// Position in the flat face-index stream.
        component: usize,
        /// The offending index.
        index: u32,
        /// Which attribute array was indexed.
        attribute: &'static str,
        /// Length of that attribute array.
        len: usize,
    },

    /// The model's attributes cannot be represented by the requested vertex type.
    #[error("unsupported vertex format: {0}")]
    UnsupportedVertexFormat(VertexFormat),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of a text asset could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Error loading an asset from file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl MeshError {
    /// Create an invalid mode error.
    pub fn invalid_mode(operation: &'static str, expected: Mode, found: Mode) -> Self {
        MeshError::InvalidMode {
            operation,
            expected,
            found,
        }
    }

    /// Create a parse error for a 1-based line number.
    pub fn parse<T: std::fmt::Display>(line: usize, message: T) -> Self {
        MeshError::Parse {
            line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mode_message() {
        let e = MeshError::invalid_mode("slice", Mode::Flat, Mode::Indexed);
        assert_eq!(e.to_string(), "slice requires a flat mesh, got indexed");
    }

    #[test]
    fn test_parse_message() {
        let e = MeshError::parse(12, "expected 3 components");
        assert_eq!(e.to_string(), "parse error at line 12: expected 3 components");
    }
}
