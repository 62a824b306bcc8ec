//! Annotation references and output cell positions
//!
//! An annotation reference pairs a 1-indexed output column with the full
//! provenance annotation of its row: `"<column> <annotation>"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{IdentifierError, IdentifierResult};
use super::source_id::parse_ordinal;

/// Separates the column ordinal from the annotation
pub const REFERENCE_DELIMITER: char = ' ';

/// `(column, annotation)` attached to one rendered output cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRef {
    /// 1-indexed output column
    pub column: u32,
    /// Raw provenance annotation of the row
    pub annotation: String,
}

impl AnnotationRef {
    pub fn new(column: u32, annotation: impl Into<String>) -> Self {
        Self {
            column,
            annotation: annotation.into(),
        }
    }

    /// Parse `"<column> <annotation>"`. The annotation may itself be empty.
    pub fn parse(input: &str) -> IdentifierResult<Self> {
        let (column, annotation) =
            input
                .split_once(REFERENCE_DELIMITER)
                .ok_or_else(|| IdentifierError::MissingField {
                    field: "annotation",
                    input: input.to_string(),
                })?;
        let column = parse_ordinal(column, input)?;
        Ok(Self::new(column, annotation))
    }
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, REFERENCE_DELIMITER, self.annotation)
    }
}

/// Encode the reference carried by output cell `column` of a row
pub fn encode_annotation_ref(column: u32, annotation: &str) -> String {
    AnnotationRef::new(column, annotation).to_string()
}

/// Inverse of [`encode_annotation_ref`]
pub fn decode_annotation_ref(input: &str) -> IdentifierResult<AnnotationRef> {
    AnnotationRef::parse(input)
}

/// Position of a cell in one rendered query result
///
/// Only meaningful within a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputCellPosition {
    /// 0-indexed result row
    pub row: usize,
    /// 1-indexed output column
    pub column: u32,
}

impl OutputCellPosition {
    pub fn new(row: usize, column: u32) -> Self {
        Self { row, column }
    }
}
