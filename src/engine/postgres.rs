//! PostgreSQL provenance engine over sqlx
//!
//! One pooled connection, so at most one query is in flight and session setup
//! carries over to the statement after it. Every statement goes through the
//! simple query protocol, which hands back every value as text whatever its
//! SQL type.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Column, Decode, Executor, Postgres, Row, ValueRef};

use super::errors::{EngineError, EngineResult};
use super::{
    ProvenanceEngine, RelationDescriptor, ResultSet, PROVENANCE_COLUMN, PROVENANCE_NAMESPACE,
    PUBLIC_NAMESPACE,
};
use crate::config::ConnectionSettings;
use crate::observability::{log_event_with_fields, Event};
use crate::query::WrappedQuery;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Relations carrying a provenance-token column named after the engine,
/// excluding the engine's own tables
fn discovery_sql() -> String {
    format!(
        "SELECT relname, \
                a1.attrelid, \
                (SELECT count(*) FROM pg_attribute a2 \
                  WHERE a2.attrelid = a1.attrelid AND a2.attnum > 0 AND NOT a2.attisdropped) - 1 AS c \
           FROM pg_attribute a1 \
           JOIN pg_type ON a1.atttypid = pg_type.oid \
           JOIN pg_namespace ns1 ON typnamespace = ns1.oid \
           JOIN pg_class ON a1.attrelid = pg_class.oid \
           JOIN pg_namespace ns2 ON relnamespace = ns2.oid \
          WHERE typname = 'provenance_token' \
            AND relkind = 'r' \
            AND ns1.nspname = '{ns}' \
            AND ns2.nspname <> '{ns}' \
            AND attname = '{col}' \
          ORDER BY relname",
        ns = PROVENANCE_NAMESPACE,
        col = PROVENANCE_COLUMN,
    )
}

fn attributes_sql(internal_id: u32) -> String {
    format!(
        "SELECT attname FROM pg_attribute \
          WHERE attrelid = {} AND attnum > 0 AND NOT attisdropped \
          ORDER BY attnum",
        internal_id
    )
}

fn session_setup_sql() -> String {
    format!("SET search_path TO {}, {}", PUBLIC_NAMESPACE, PROVENANCE_NAMESPACE)
}

/// Quote a relation name as an SQL identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct PgEngine {
    pool: PgPool,
}

impl PgEngine {
    /// Connect to the engine. Failure here is fatal for the caller.
    pub async fn connect(settings: &ConnectionSettings) -> EngineResult<Self> {
        let options = connect_options(settings)?;
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout(settings))
            .connect_with(options)
            .await
            .map_err(|e| {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::EngineConnectFailed,
                    &[
                        ("connection", settings.redacted().as_str()),
                        ("reason", reason.as_str()),
                    ],
                );
                EngineError::Connection(reason)
            })?;

        log_event_with_fields(
            Event::EngineConnected,
            &[("connection", settings.redacted().as_str())],
        );
        Ok(Self { pool })
    }

    async fn fetch_text(&self, setup: Option<&str>, statement: &str) -> Result<ResultSet, sqlx::Error> {
        let script = match setup {
            Some(setup) => format!("{};\n{}", setup, statement),
            None => statement.to_string(),
        };
        let rows = sqlx::raw_sql(&script).fetch_all(&self.pool).await?;
        if !rows.is_empty() {
            return to_result_set(&rows);
        }

        // No row to read names from; ask the server for the row shape.
        let described = (&self.pool).describe(statement).await?;
        let columns = described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        Ok(ResultSet::new(columns, Vec::new()))
    }
}

#[async_trait]
impl ProvenanceEngine for PgEngine {
    async fn discover_relations(&self) -> EngineResult<Vec<RelationDescriptor>> {
        let set = self
            .fetch_text(None, &discovery_sql())
            .await
            .map_err(|e| classify(e, EngineError::Catalog))?;

        set.rows
            .into_iter()
            .map(|row| -> EngineResult<RelationDescriptor> {
                let field = |i: usize| row.get(i).cloned().flatten().unwrap_or_default();
                let name = field(0);
                let internal_id = field(1).parse::<u32>().map_err(|_| {
                    EngineError::Catalog(format!("bad relation id '{}' for '{}'", field(1), name))
                })?;
                let visible_columns = field(2).parse::<usize>().map_err(|_| {
                    EngineError::Catalog(format!("bad column count '{}' for '{}'", field(2), name))
                })?;
                Ok(RelationDescriptor {
                    name,
                    internal_id,
                    visible_columns,
                })
            })
            .collect()
    }

    async fn relation_attributes(&self, relation: &RelationDescriptor) -> EngineResult<Vec<String>> {
        let set = self
            .fetch_text(None, &attributes_sql(relation.internal_id))
            .await
            .map_err(|e| classify(e, EngineError::Catalog))?;
        Ok(set
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    async fn fetch_relation_rows(&self, relation: &RelationDescriptor) -> EngineResult<ResultSet> {
        let statement = format!(
            "SELECT * FROM (SELECT * FROM {}) t",
            quote_identifier(&relation.name)
        );
        self.fetch_text(Some(&session_setup_sql()), &statement)
            .await
            .map_err(|e| classify(e, EngineError::Catalog))
    }

    async fn execute_wrapped(&self, query: &WrappedQuery) -> EngineResult<ResultSet> {
        self.fetch_text(Some(&query.setup), &query.statement)
            .await
            .map(strip_token_column)
            .map_err(|e| classify(e, EngineError::Execution))
    }
}

fn connect_options(settings: &ConnectionSettings) -> EngineResult<PgConnectOptions> {
    match settings {
        ConnectionSettings::Url(url) => url
            .parse::<PgConnectOptions>()
            .map_err(|e| EngineError::Connection(e.to_string())),
        ConnectionSettings::Keywords(kw) => {
            let mut options = PgConnectOptions::new();
            if let Some(address) = kw.address() {
                options = options.host(address);
            }
            if let Some(port) = kw.port {
                options = options.port(port);
            }
            if let Some(user) = &kw.user {
                options = options.username(user);
            }
            if let Some(password) = &kw.password {
                options = options.password(password);
            }
            if let Some(dbname) = &kw.dbname {
                options = options.database(dbname);
            }
            if let Some(mode) = &kw.sslmode {
                let mode = PgSslMode::from_str(mode)
                    .map_err(|e| EngineError::Connection(e.to_string()))?;
                options = options.ssl_mode(mode);
            }
            if let Some(path) = &kw.sslrootcert {
                options = options.ssl_root_cert(path);
            }
            if let Some(path) = &kw.sslcert {
                options = options.ssl_client_cert(path);
            }
            if let Some(path) = &kw.sslkey {
                options = options.ssl_client_key(path);
            }
            if let Some(name) = &kw.application_name {
                options = options.application_name(name);
            }
            let backend = kw.backend_options();
            if !backend.is_empty() {
                options = options.options(backend);
            }
            Ok(options)
        }
    }
}

fn acquire_timeout(settings: &ConnectionSettings) -> Duration {
    match settings {
        ConnectionSettings::Keywords(kw) => match kw.connect_timeout {
            Some(0) => Duration::MAX,
            Some(seconds) => Duration::from_secs(seconds),
            None => ACQUIRE_TIMEOUT,
        },
        ConnectionSettings::Url(_) => ACQUIRE_TIMEOUT,
    }
}

/// Lost connections are fatal whatever the statement was
fn classify(err: sqlx::Error, otherwise: fn(String) -> EngineError) -> EngineError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => EngineError::Connection(err.to_string()),
        other => otherwise(other.to_string()),
    }
}

/// The engine appends its own token column after every projection over
/// tagged relations, the annotation included. Drop it so the annotation is
/// last.
fn strip_token_column(mut set: ResultSet) -> ResultSet {
    if set.columns.last().map(String::as_str) != Some(PROVENANCE_COLUMN) || set.columns.len() < 2 {
        return set;
    }
    set.columns.pop();
    for row in &mut set.rows {
        row.pop();
    }
    set
}

fn to_result_set(rows: &[PgRow]) -> Result<ResultSet, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let rows = rows.iter().map(row_to_text).collect::<Result<Vec<_>, _>>()?;
    Ok(ResultSet::new(columns, rows))
}

fn row_to_text(row: &PgRow) -> Result<Vec<Option<String>>, sqlx::Error> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(None);
            }
            <String as Decode<Postgres>>::decode(raw)
                .map(Some)
                .map_err(|source| sqlx::Error::ColumnDecode {
                    index: i.to_string(),
                    source,
                })
        })
        .collect()
}
