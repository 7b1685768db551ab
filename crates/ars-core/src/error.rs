//! # Validation Errors
//!
//! Raised when upload metadata or request coordinates fail the addressing
//! rules. All variants are client faults.

use thiserror::Error;

/// Validation errors for release coordinates and file names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required coordinate field was empty or missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A coordinate field would not form a single safe path segment.
    #[error("invalid {field}: \"{value}\" (must be a single path segment)")]
    InvalidSegment {
        /// The field that was rejected.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The file name has no usable base component.
    #[error("invalid file name: \"{0}\"")]
    InvalidFileName(String),
}
