//! Provenance annotations
//!
//! The engine attaches one annotation string to every output row: an ordered
//! list of correlation groups, group `i` explaining output column `i + 1`.
//! This module parses that string into a [`ProvenanceAnnotation`] and decodes
//! the group for a single column.

mod decoder;
mod errors;
mod grammar;

pub use decoder::{decode, decode_reference, encode_groups, CorrelationSet};
pub use errors::{AnnotationError, AnnotationResult};
pub use grammar::{
    CorrelationGroup, ProvenanceAnnotation, ANNOTATION_GRAMMAR_VERSION, GROUP_SEPARATOR,
    ID_SEPARATOR,
};
