//! JSON API Routes
//!
//! Machine-readable versions of the panel: the rendered catalog, annotated
//! query results, and decoding of annotation references.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::panel_routes::PanelState;
use crate::annotation::{decode_reference, AnnotationError, ProvenanceAnnotation};
use crate::catalog::{render_catalog, CatalogError, CatalogView};
use crate::identifier::{decode_annotation_ref, TaggedCellId};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{run_query, QueryError, ResultTable};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub table: ResultTable,
    pub row_count: usize,
    pub executed_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CorrelateRequest {
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct CorrelateResponse {
    pub reference: String,
    pub identifiers: Vec<TaggedCellId>,
    /// Whole parsed annotation, when the reference carried a valid one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<ProvenanceAnnotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
            status: status.as_u16(),
        }),
    )
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = match err {
            CatalogError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, err.code(), err.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        api_error(status, err.code(), err.to_string())
    }
}

// ==================
// API Routes
// ==================

/// Create API routes
pub fn api_routes(state: Arc<PanelState>) -> Router {
    Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/query", post(query_handler))
        .route("/correlate", post(correlate_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn catalog_handler(
    State(state): State<Arc<PanelState>>,
) -> Result<Json<CatalogView>, ApiError> {
    let view = render_catalog(state.engine.as_ref()).await?;
    Ok(Json(view))
}

async fn query_handler(
    State(state): State<Arc<PanelState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let table = run_query(state.engine.as_ref(), &state.wrapper, &request.query).await?;
    Ok(Json(QueryResponse {
        row_count: table.row_count(),
        table,
        executed_at: Utc::now().to_rfc3339(),
    }))
}

/// Never fails: a malformed reference correlates with nothing
async fn correlate_handler(Json(request): Json<CorrelateRequest>) -> Json<CorrelateResponse> {
    Json(correlate(request.reference))
}

fn correlate(reference: String) -> CorrelateResponse {
    match decode_reference(&reference) {
        Ok(set) => {
            let annotation = decode_annotation_ref(&reference)
                .ok()
                .and_then(|parsed| ProvenanceAnnotation::parse(&parsed.annotation).ok());
            CorrelateResponse {
                reference,
                identifiers: set.into_iter().collect(),
                annotation,
                warning: None,
            }
        }
        Err(err) => {
            log_decode_failure(&reference, &err);
            CorrelateResponse {
                warning: Some(format!("{}: {}", err.code(), err)),
                reference,
                identifiers: Vec::new(),
                annotation: None,
            }
        }
    }
}

fn log_decode_failure(reference: &str, err: &AnnotationError) {
    log_event_with_fields(
        Event::DecodeFailed,
        &[
            ("code", err.code()),
            ("reason", err.to_string().as_str()),
            ("reference", reference),
        ],
    );
}
