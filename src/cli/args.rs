//! CLI argument definitions using clap
//!
//! Commands:
//! - wherepanel serve --config <path> [--host <host>] [--port <port>]
//! - wherepanel catalog --config <path>
//! - wherepanel query --config <path> --sql <query>
//! - wherepanel explain --config <path> --sql <query> --row <n> --column <n>
//! - wherepanel decode --reference <reference>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// wherepanel - where-provenance exploration panel
#[derive(Parser, Debug)]
#[command(name = "wherepanel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the panel over HTTP
    Serve {
        /// Path to the connection string file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Allowed CORS origin (repeatable; none means any)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Print the rendered source catalog
    Catalog {
        /// Path to the connection string file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Run a query and print its annotated result
    Query {
        /// Path to the connection string file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// SQL query, without its trailing semicolon
        #[arg(long)]
        sql: String,
    },

    /// Show which source cells one output cell is copied from
    Explain {
        /// Path to the connection string file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// SQL query, without its trailing semicolon
        #[arg(long)]
        sql: String,

        /// Output row, 0-indexed
        #[arg(long)]
        row: usize,

        /// Output column, 1-indexed
        #[arg(long)]
        column: u32,
    },

    /// Decode an annotation reference (`<column> <annotation>`)
    Decode {
        #[arg(long)]
        reference: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_args() {
        let cli = Cli::try_parse_from([
            "wherepanel", "explain", "--sql", "SELECT * FROM personnel", "--row", "2", "--column", "1",
        ])
        .unwrap();
        match cli.command {
            Command::Explain { config, sql, row, column } => {
                assert_eq!(config, PathBuf::from("./config"));
                assert_eq!(sql, "SELECT * FROM personnel");
                assert_eq!((row, column), (2, 1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "wherepanel", "serve", "--port", "9000", "--cors-origin", "http://a", "--cors-origin", "http://b",
        ])
        .unwrap();
        match cli.command {
            Command::Serve { host, port, cors_origins, .. } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert_eq!(cors_origins.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
