//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit.

use std::fmt;
use std::io;

use crate::annotation::AnnotationError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::query::QueryError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Engine unreachable
    ConnectionFailed,
    /// Catalog could not be rendered
    CatalogFailed,
    /// User query failed or returned a malformed result
    QueryFailed,
    /// Annotation reference could not be decoded
    DecodeFailed,
    /// Requested output cell does not exist
    NoSuchCell,
    /// I/O error (stdout)
    IoError,
    /// Runtime or server failed
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "WHERE_CLI_CONFIG_ERROR",
            Self::ConnectionFailed => "WHERE_CLI_CONNECTION_FAILED",
            Self::CatalogFailed => "WHERE_CLI_CATALOG_FAILED",
            Self::QueryFailed => "WHERE_CLI_QUERY_FAILED",
            Self::DecodeFailed => "WHERE_CLI_DECODE_FAILED",
            Self::NoSuchCell => "WHERE_CLI_NO_SUCH_CELL",
            Self::IoError => "WHERE_CLI_IO_ERROR",
            Self::BootFailed => "WHERE_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// No output cell at the requested position
    pub fn no_such_cell(row: usize, column: u32) -> Self {
        Self::new(
            CliErrorCode::NoSuchCell,
            format!("result has no cell at row {}, column {}", row, column),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, format!("{} ({})", e, e.code()))
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::new(CliErrorCode::ConnectionFailed, format!("{} ({})", e, e.code()))
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        let code = match e {
            CatalogError::Connection(_) => CliErrorCode::ConnectionFailed,
            _ => CliErrorCode::CatalogFailed,
        };
        Self::new(code, format!("{} ({})", e, e.code()))
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        let code = match e {
            QueryError::Connection(_) => CliErrorCode::ConnectionFailed,
            _ => CliErrorCode::QueryFailed,
        };
        Self::new(code, format!("{} ({})", e, e.code()))
    }
}

impl From<AnnotationError> for CliError {
    fn from(e: AnnotationError) -> Self {
        Self::new(CliErrorCode::DecodeFailed, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
