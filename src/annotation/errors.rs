//! Annotation parsing errors

use thiserror::Error;

use crate::identifier::IdentifierError;

pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// A provenance annotation that does not follow the group-list grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("expected an opening delimiter at the start of '{input}'")]
    MissingEnclosure { input: String },

    #[error("unclosed {expected:?} in '{input}'")]
    Unclosed { expected: char, input: String },

    #[error("unexpected {found:?} at offset {offset} in '{input}'")]
    UnexpectedCloser {
        found: char,
        offset: usize,
        input: String,
    },

    #[error("expected {expected:?} but found {found:?} at offset {offset} in '{input}'")]
    MismatchedDelimiter {
        expected: char,
        found: char,
        offset: usize,
        input: String,
    },

    #[error("correlation group '{group}' nests another group")]
    NestedGroup { group: String },

    #[error("correlation group '{group}' contains an empty identifier")]
    EmptyIdentifier { group: String },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

impl AnnotationError {
    pub fn code(&self) -> &'static str {
        match self {
            AnnotationError::Identifier(inner) => inner.code(),
            _ => "WHERE_MALFORMED_ANNOTATION",
        }
    }
}
