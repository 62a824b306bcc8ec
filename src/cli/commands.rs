//! CLI command implementations
//!
//! Every command except `decode` loads the connection string and connects to
//! the engine first; a connection failure ends the command.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Runtime;

use crate::annotation::decode_reference;
use crate::catalog::{render_catalog, CatalogCell};
use crate::config::PanelConfig;
use crate::engine::{PgEngine, ProvenanceEngine};
use crate::highlight::HighlightController;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::identifier::{OutputCellPosition, TaggedCellId};
use crate::query::{run_query, QueryWrapper};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Which source cells an output cell is copied from
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub position: OutputCellPosition,
    pub value: Option<String>,
    pub reference: String,
    /// Highlighted source cells with their values, in identifier order
    pub sources: Vec<CatalogCell>,
}

#[derive(Debug, Serialize)]
struct Decoded {
    reference: String,
    identifiers: Vec<TaggedCellId>,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            host,
            port,
            cors_origins,
        } => serve(&config, host, port, cors_origins),
        Command::Catalog { config } => catalog(&config),
        Command::Query { config, sql } => query(&config, &sql),
        Command::Explain {
            config,
            sql,
            row,
            column,
        } => explain(&config, &sql, OutputCellPosition::new(row, column)),
        Command::Decode { reference } => decode(&reference),
    }
}

/// Serve the panel until the process is stopped
pub fn serve(
    config_path: &Path,
    host: Option<String>,
    port: Option<u16>,
    cors_origins: Vec<String>,
) -> CliResult<()> {
    let defaults = HttpServerConfig::default();
    let server_config = HttpServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        cors_origins,
    };
    let config = PanelConfig::load(config_path)?.with_server(server_config);

    runtime()?.block_on(async {
        let engine = PgEngine::connect(&config.connection).await?;
        let server = HttpServer::with_engine(config.server, Arc::new(engine));
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the rendered catalog
pub fn catalog(config_path: &Path) -> CliResult<()> {
    let config = PanelConfig::load(config_path)?;
    let view = runtime()?.block_on(async {
        let engine = PgEngine::connect(&config.connection).await?;
        render_catalog(&engine).await.map_err(CliError::from)
    })?;
    write_response(&view)
}

/// Print the annotated result of one query
pub fn query(config_path: &Path, sql: &str) -> CliResult<()> {
    let config = PanelConfig::load(config_path)?;
    let table = runtime()?.block_on(async {
        let engine = PgEngine::connect(&config.connection).await?;
        run_query(&engine, &QueryWrapper::default(), sql)
            .await
            .map_err(CliError::from)
    })?;
    write_response(&table)
}

/// Print the source cells highlighted by hovering one output cell
pub fn explain(config_path: &Path, sql: &str, position: OutputCellPosition) -> CliResult<()> {
    let config = PanelConfig::load(config_path)?;
    let explanation = runtime()?.block_on(async {
        let engine = PgEngine::connect(&config.connection).await?;
        explain_cell(&engine, sql, position).await
    })?;
    write_response(&explanation)
}

/// Decode an annotation reference without touching the engine
pub fn decode(reference: &str) -> CliResult<()> {
    let identifiers = decode_reference(reference)?.into_iter().collect();
    write_response(&Decoded {
        reference: reference.to_string(),
        identifiers,
    })
}

/// Render catalog and result, then hover `position` once
pub async fn explain_cell(
    engine: &dyn ProvenanceEngine,
    sql: &str,
    position: OutputCellPosition,
) -> CliResult<Explanation> {
    let view = render_catalog(engine).await?;
    let table = run_query(engine, &QueryWrapper::default(), sql).await?;
    let cell = table
        .cell(position)
        .ok_or_else(|| CliError::no_such_cell(position.row, position.column))?;

    let mut controller = HighlightController::new(view.addressable_ids());
    let delta = controller.on_enter(position, &cell.reference);
    let mut sources: Vec<CatalogCell> = delta
        .activated
        .iter()
        .filter_map(|id| view.cell(id).cloned())
        .collect();
    sources.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Explanation {
        position,
        value: cell.value.clone(),
        reference: cell.reference.clone(),
        sources,
    })
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new().map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}
