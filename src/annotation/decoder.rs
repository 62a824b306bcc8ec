//! Correlation decoder
//!
//! Pure functions from `(column, annotation)` to the set of source cells
//! correlated with that column. Runs on every hover, so it holds no state.

use std::collections::BTreeSet;

use super::errors::AnnotationResult;
use super::grammar::ProvenanceAnnotation;
use crate::identifier::{AnnotationRef, TaggedCellId};

/// Decoded Correlation Set
pub type CorrelationSet = BTreeSet<TaggedCellId>;

/// Decode the identifiers explaining 1-indexed output `column`
///
/// An empty annotation, an empty group or an out-of-range column all yield
/// the empty set. Only a malformed annotation is an error.
pub fn decode(column: u32, annotation: &str) -> AnnotationResult<CorrelationSet> {
    let parsed = ProvenanceAnnotation::parse(annotation)?;
    Ok(parsed
        .group_for_column(column)
        .map(|group| group.ids().clone())
        .unwrap_or_default())
}

/// Decode a full annotation reference (`"<column> <annotation>"`)
pub fn decode_reference(reference: &str) -> AnnotationResult<CorrelationSet> {
    if reference.trim().is_empty() {
        return Ok(CorrelationSet::new());
    }
    let reference = AnnotationRef::parse(reference)?;
    decode(reference.column, &reference.annotation)
}

/// Encode one correlation set per output column, in column order
pub fn encode_groups<I, G>(groups: I) -> String
where
    I: IntoIterator<Item = G>,
    G: IntoIterator<Item = TaggedCellId>,
{
    let groups = groups
        .into_iter()
        .map(|group| group.into_iter().collect())
        .collect();
    ProvenanceAnnotation::new(groups).encode()
}
