//! Errors produced while parsing identifiers.

use thiserror::Error;

/// Errors that can occur when parsing an ID string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty.
    #[error("ID cannot be empty")]
    Empty,

    /// No `_` between prefix and ULID.
    #[error("ID '{0}' has no '_' separator")]
    MissingSeparator(String),

    /// The prefix names a different kind of record.
    #[error("wrong ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The part after the separator is not a ULID.
    #[error("invalid ULID '{value}': {reason}")]
    InvalidUlid { value: String, reason: String },
}

impl IdError {
    /// Returns true if the ID parsed but belongs to another record kind.
    pub fn is_prefix_error(&self) -> bool {
        matches!(self, IdError::InvalidPrefix { .. })
    }
}
