//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config file {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("invalid connection string: {reason}")]
    InvalidConnectionString { reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "WHERE_CONFIG_EMPTY",
            Self::InvalidConnectionString { .. } => "WHERE_CONFIG_INVALID_CONNECTION",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConnectionString {
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
