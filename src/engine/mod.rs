//! Provenance engine boundary
//!
//! The engine runs SQL and computes provenance. The panel only needs four
//! things from it, captured by [`ProvenanceEngine`]:
//!
//! - discover provenance-tagged relations
//! - list a relation's attributes
//! - fetch a relation's rows
//! - execute a wrapped user query
//!
//! All values come back as text, NULL preserved.

mod errors;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;

pub use errors::{EngineError, EngineResult};
pub use memory::{MemoryEngine, MemoryRelation};
pub use postgres::PgEngine;

use crate::query::WrappedQuery;

/// Schema the engine installs its functions and types in
pub const PROVENANCE_NAMESPACE: &str = "provsql";

/// Schema user relations live in
pub const PUBLIC_NAMESPACE: &str = "public";

/// Name of the column the engine adds to tracked relations
pub const PROVENANCE_COLUMN: &str = "provsql";

/// A relation reported by catalog discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDescriptor {
    pub name: String,
    /// Engine-internal relation id
    pub internal_id: u32,
    /// Number of attributes excluding the provenance column
    pub visible_columns: usize,
}

/// Textual result of one statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Number of fields per row; falls back to the first row when no column
    /// metadata is available
    pub fn width(&self) -> usize {
        if !self.columns.is_empty() {
            return self.columns.len();
        }
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
pub trait ProvenanceEngine: Send + Sync {
    /// Relations with a provenance-token column, outside the engine's own schema
    async fn discover_relations(&self) -> EngineResult<Vec<RelationDescriptor>>;

    /// All attribute names of `relation`, in ordinal order
    async fn relation_attributes(&self, relation: &RelationDescriptor) -> EngineResult<Vec<String>>;

    /// Every row of `relation`, provenance column included
    async fn fetch_relation_rows(&self, relation: &RelationDescriptor) -> EngineResult<ResultSet>;

    /// Run the session setup then the wrapped statement
    async fn execute_wrapped(&self, query: &WrappedQuery) -> EngineResult<ResultSet>;
}
