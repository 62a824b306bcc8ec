//! Query submission errors

use thiserror::Error;

use crate::engine::EngineError;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    /// The wrapped query failed in the engine
    #[error("query failed: {0}")]
    Execution(String),

    /// The engine is unreachable; nothing can render
    #[error("connection failed: {0}")]
    Connection(String),

    /// Fewer than one data column plus the annotation column
    #[error("malformed result: {rows} row(s) of width {width}, expected at least one column plus the provenance annotation")]
    MalformedResult { rows: usize, width: usize },

    #[error("malformed result: row {row} has {found} field(s), expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Empty | QueryError::Execution(_) => "WHERE_USER_QUERY_FAILURE",
            QueryError::Connection(_) => "WHERE_CONNECTION_FAILURE",
            QueryError::MalformedResult { .. } | QueryError::RaggedRow { .. } => {
                "WHERE_MALFORMED_RESULT"
            }
        }
    }

    /// HTTP status for the JSON API
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::Empty | QueryError::Execution(_) => 400,
            QueryError::MalformedResult { .. } | QueryError::RaggedRow { .. } => 422,
            QueryError::Connection(_) => 503,
        }
    }
}

impl From<EngineError> for QueryError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Connection(reason) => QueryError::Connection(reason),
            other => QueryError::Execution(other.to_string()),
        }
    }
}
