//! Panel configuration
//!
//! The connection string lives in a plain text file (`./config` unless told
//! otherwise). A missing file is not an error: the panel falls back to the
//! local default and says so in the log.

mod connection;
mod errors;

pub use connection::{ConnectionKeywords, ConnectionSettings, DEFAULT_CONNECTION};
pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::http_server::HttpServerConfig;
use crate::observability::{log_event_with_fields, Event};

/// Default location of the connection string file
pub const DEFAULT_CONFIG_PATH: &str = "./config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelConfig {
    pub connection: ConnectionSettings,
    pub server: HttpServerConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            server: HttpServerConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Load the connection string from `path`
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log_event_with_fields(
                    Event::ConfigFileMissing,
                    &[
                        ("path", path.display().to_string().as_str()),
                        ("reason", e.to_string().as_str()),
                        ("fallback", DEFAULT_CONNECTION),
                    ],
                );
                return Ok(Self::default());
            }
        };

        let content = content.trim();
        if content.is_empty() {
            return Err(ConfigError::Empty {
                path: PathBuf::from(path),
            });
        }

        let connection = ConnectionSettings::parse(content)?;
        if let ConnectionSettings::Keywords(kw) = &connection {
            for keyword in &kw.ignored {
                log_event_with_fields(
                    Event::ConnectionKeywordIgnored,
                    &[("keyword", keyword.as_str())],
                );
            }
        }
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("connection", connection.redacted().as_str()),
            ],
        );
        Ok(Self {
            connection,
            ..Self::default()
        })
    }

    pub fn with_server(mut self, server: HttpServerConfig) -> Self {
        self.server = server;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PanelConfig::load(&dir.path().join("config")).unwrap();
        assert_eq!(config.connection, ConnectionSettings::default());
        assert_eq!(config.connection.redacted(), DEFAULT_CONNECTION);
    }

    #[test]
    fn test_loads_trimmed_contents() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  host=db.local dbname=provdemo  ").unwrap();
        let config = PanelConfig::load(file.path()).unwrap();
        let ConnectionSettings::Keywords(kw) = config.connection else {
            panic!("expected keyword form");
        };
        assert_eq!(kw.host.as_deref(), Some("db.local"));
        assert_eq!(kw.dbname.as_deref(), Some("provdemo"));
    }

    #[test]
    fn test_empty_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        let err = PanelConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "WHERE_CONFIG_EMPTY");
    }

    #[test]
    fn test_invalid_contents_are_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "host=db port=many").unwrap();
        assert!(matches!(
            PanelConfig::load(file.path()),
            Err(ConfigError::InvalidConnectionString { .. })
        ));
    }

    #[test]
    fn test_libpq_options_do_not_block_startup() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "host=db sslmode=require connect_timeout=5 application_name=x keepalives=1").unwrap();
        let config = PanelConfig::load(file.path()).unwrap();
        let ConnectionSettings::Keywords(kw) = config.connection else {
            panic!("expected keyword form");
        };
        assert_eq!(kw.sslmode.as_deref(), Some("require"));
        assert_eq!(kw.connect_timeout, Some(5));
        assert_eq!(kw.ignored, vec!["keepalives"]);
    }
}
