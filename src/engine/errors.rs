//! Provenance engine errors

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Cannot reach the engine at all; rendering halts
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("catalog query failed: {0}")]
    Catalog(String),

    #[error("query failed: {0}")]
    Execution(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Connection(_) => "WHERE_CONNECTION_FAILURE",
            EngineError::Catalog(_) => "WHERE_CATALOG_QUERY_FAILURE",
            EngineError::Execution(_) => "WHERE_USER_QUERY_FAILURE",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Connection(_))
    }
}
