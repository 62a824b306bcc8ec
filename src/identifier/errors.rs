//! Identifier decoding and encoding errors

use thiserror::Error;

/// Result type for identifier operations
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// A Tagged Cell Identifier or annotation reference that cannot be encoded or decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("missing {field} in '{input}'")]
    MissingField { field: &'static str, input: String },

    #[error("empty {field} in '{input}'")]
    EmptyField { field: &'static str, input: String },

    #[error("non-numeric column ordinal '{value}' in '{input}'")]
    NonNumericOrdinal { value: String, input: String },

    #[error("column ordinal must be 1 or greater in '{input}'")]
    ZeroOrdinal { input: String },

    #[error("unexpected extra field in '{input}'")]
    ExtraField { input: String },

    #[error("{field} '{value}' contains reserved character {ch:?}")]
    ReservedCharacter {
        field: &'static str,
        value: String,
        ch: char,
    },
}

impl IdentifierError {
    pub fn code(&self) -> &'static str {
        "WHERE_MALFORMED_IDENTIFIER"
    }
}
