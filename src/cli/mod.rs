//! CLI module for the where-provenance panel
//!
//! Provides command-line interface for:
//! - serve: Connect to the engine and serve the panel over HTTP
//! - catalog: Print the rendered source catalog
//! - query: Run one query and print its annotated result
//! - explain: Print the source cells one output cell is copied from
//! - decode: Decode an annotation reference

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    catalog, decode, explain, explain_cell, query, run, run_command, serve, Explanation,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
