//! Identifier scheme
//!
//! How source cells and output cells are named as strings:
//!
//! - Tagged Cell Identifier: `relation ":" token ":" column`
//! - Annotation reference: `column " " annotation`
//!
//! `:` is reserved inside identifier fields; `(`, `)`, `[`, `]`, `{`, `}`,
//! `,`, `;` and whitespace are reserved anywhere in an identifier because the
//! annotation grammar nests identifiers inside them. Encoding rejects fields
//! that contain any of them.

mod annotation_ref;
mod errors;
mod source_id;

pub use annotation_ref::{
    decode_annotation_ref, encode_annotation_ref, AnnotationRef, OutputCellPosition,
    REFERENCE_DELIMITER,
};
pub use errors::{IdentifierError, IdentifierResult};
pub use source_id::{
    decode_source_id, encode_source_id, is_reserved, TaggedCellId, ANNOTATION_RESERVED,
    FIELD_DELIMITER,
};
