//! Correlation Protocol Tests
//!
//! Tests for the string protocol between result cells and source cells:
//! - Decode/encode round trip per column
//! - Column ordinal off-by-one and out of range
//! - Empty and malformed annotations
//! - Both annotation dialects

use std::collections::BTreeSet;

use wherepanel::annotation::{
    decode, decode_reference, encode_groups, AnnotationError, ProvenanceAnnotation,
};
use wherepanel::identifier::{encode_annotation_ref, TaggedCellId};

// =============================================================================
// Helper Functions
// =============================================================================

fn id(relation: &str, token: &str, column: u32) -> TaggedCellId {
    TaggedCellId::new(relation, token, column).unwrap()
}

fn set(ids: &[TaggedCellId]) -> BTreeSet<TaggedCellId> {
    ids.iter().cloned().collect()
}

// =============================================================================
// Round Trip
// =============================================================================

/// Decoding an encoded annotation at each ordinal returns that column's set.
#[test]
fn test_round_trip_every_column() {
    let groups = vec![
        set(&[id("personnel", "t1", 1), id("personnel", "t2", 1)]),
        set(&[]),
        set(&[id("dept", "a9f0", 3)]),
    ];
    let annotation = encode_groups(groups.clone());

    for (i, expected) in groups.iter().enumerate() {
        let decoded = decode((i + 1) as u32, &annotation).unwrap();
        assert_eq!(&decoded, expected, "column {}", i + 1);
    }
}

/// The structured form re-encodes to the same string.
#[test]
fn test_structured_annotation_reencodes() {
    let text = "((personnel:t1:1;personnel:t2:1),(personnel:t1:2))";
    let parsed = ProvenanceAnnotation::parse(text).unwrap();
    assert_eq!(parsed.version, 1);
    assert_eq!(parsed.encode(), text);
}

// =============================================================================
// Column Ordinals
// =============================================================================

#[test]
fn test_ordinal_selects_matching_group() {
    let annotation = "((a:t1:1),(b:t2:2),(c:t3:3))";
    assert_eq!(decode(2, annotation).unwrap(), set(&[id("b", "t2", 2)]));
    assert!(decode(4, annotation).unwrap().is_empty());
    assert!(decode(0, annotation).unwrap().is_empty());
}

#[test]
fn test_decode_is_idempotent() {
    let reference = encode_annotation_ref(1, "((a:t1:1;a:t2:1))");
    assert_eq!(
        decode_reference(&reference).unwrap(),
        decode_reference(&reference).unwrap()
    );
}

// =============================================================================
// Empty and Malformed Input
// =============================================================================

#[test]
fn test_empty_forms_decode_to_empty_set() {
    for reference in ["", "1 ()", "1 (())"] {
        assert!(decode_reference(reference).unwrap().is_empty(), "{:?}", reference);
    }
}

#[test]
fn test_unbalanced_annotation_is_malformed() {
    let err = decode_reference("1 (a;b").unwrap_err();
    assert!(matches!(err, AnnotationError::Unclosed { .. }));
    assert_eq!(err.code(), "WHERE_MALFORMED_ANNOTATION");
}

#[test]
fn test_bad_identifier_inside_annotation() {
    let err = decode_reference("1 ((personnel:t1))").unwrap_err();
    assert_eq!(err.code(), "WHERE_MALFORMED_IDENTIFIER");
}

// =============================================================================
// Dialects
// =============================================================================

/// The engine emits braces and brackets; both dialects decode alike.
#[test]
fn test_engine_bracket_dialect() {
    let engine = "{[personnel:t1:1;personnel:t2:1],[personnel:t1:2]}";
    let panel = "((personnel:t1:1;personnel:t2:1),(personnel:t1:2))";
    for column in 1..=2 {
        assert_eq!(decode(column, engine).unwrap(), decode(column, panel).unwrap());
    }
}

#[test]
fn test_mismatched_delimiters_are_malformed() {
    assert!(decode(1, "{[a:t1:1)}").is_err());
}
