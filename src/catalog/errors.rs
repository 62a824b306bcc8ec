//! Catalog errors
//!
//! Discovery failing is fatal for the catalog; anything that goes wrong with a
//! single relation only skips that relation.

use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("catalog discovery failed: {0}")]
    Discovery(String),

    #[error("cannot read attributes of '{relation}': {reason}")]
    Attributes { relation: String, reason: String },

    #[error("cannot fetch rows of '{relation}': {reason}")]
    Rows { relation: String, reason: String },

    #[error("relation '{relation}' has no '{column}' provenance column")]
    NoProvenanceColumn { relation: String, column: String },

    #[error("relation '{relation}' cannot be addressed: {reason}")]
    UnaddressableRelation { relation: String, reason: String },

    #[error("row {row} of '{relation}' has {found} field(s) or no token, expected {expected}")]
    RowShape {
        relation: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Connection(_) => "WHERE_CONNECTION_FAILURE",
            _ => "WHERE_CATALOG_QUERY_FAILURE",
        }
    }

    /// Relation the error is isolated to, if any
    pub fn relation(&self) -> Option<&str> {
        match self {
            CatalogError::Connection(_) | CatalogError::Discovery(_) => None,
            CatalogError::Attributes { relation, .. }
            | CatalogError::Rows { relation, .. }
            | CatalogError::NoProvenanceColumn { relation, .. }
            | CatalogError::UnaddressableRelation { relation, .. }
            | CatalogError::RowShape { relation, .. } => Some(relation),
        }
    }

    pub fn from_discovery(err: EngineError) -> Self {
        match err {
            EngineError::Connection(reason) => CatalogError::Connection(reason),
            other => CatalogError::Discovery(other.to_string()),
        }
    }
}

/// Serializable record of a relation skipped during rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogIssue {
    pub relation: String,
    pub code: String,
    pub message: String,
}

impl From<&CatalogError> for CatalogIssue {
    fn from(err: &CatalogError) -> Self {
        Self {
            relation: err.relation().unwrap_or_default().to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
