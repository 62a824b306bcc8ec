//! Panel HTTP Routes
//!
//! The HTML page: catalog on the left, query form and annotated result on the
//! right. `GET /` shows the form with the default query, `POST /` runs the
//! submitted one.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::page::{render_page, Submission, DEFAULT_QUERY};
use crate::catalog::{render_catalog, CatalogError};
use crate::engine::ProvenanceEngine;
use crate::query::{run_query, QueryWrapper};

// ==================
// Shared State
// ==================

/// Engine handle and query wrapper shared by the page and the JSON API
pub struct PanelState {
    pub engine: Arc<dyn ProvenanceEngine>,
    pub wrapper: QueryWrapper,
}

impl PanelState {
    pub fn new(engine: Arc<dyn ProvenanceEngine>) -> Self {
        Self {
            engine,
            wrapper: QueryWrapper::default(),
        }
    }
}

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
pub struct PanelForm {
    #[serde(default)]
    pub request: String,
}

// ==================
// Panel Routes
// ==================

/// Create panel routes
pub fn panel_routes(state: Arc<PanelState>) -> Router {
    Router::new()
        .route("/", get(show_panel_handler).post(submit_query_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn show_panel_handler(State(state): State<Arc<PanelState>>) -> (StatusCode, Html<String>) {
    let catalog = render_catalog(state.engine.as_ref()).await;
    let status = catalog_status(&catalog);
    let html = render_page(&catalog, DEFAULT_QUERY, Submission::None, Utc::now());
    (status, Html(html))
}

async fn submit_query_handler(
    State(state): State<Arc<PanelState>>,
    Form(form): Form<PanelForm>,
) -> (StatusCode, Html<String>) {
    let catalog = render_catalog(state.engine.as_ref()).await;
    let status = catalog_status(&catalog);

    // A dead connection already shows on the catalog side. Other catalog
    // failures stay on the left panel and the query still runs.
    if matches!(catalog, Err(CatalogError::Connection(_))) {
        let html = render_page(&catalog, &form.request, Submission::None, Utc::now());
        return (status, Html(html));
    }

    let outcome = run_query(state.engine.as_ref(), &state.wrapper, &form.request).await;
    let submission = match &outcome {
        Ok(table) => Submission::Rendered(table),
        Err(err) => Submission::Failed(err),
    };
    let html = render_page(&catalog, &form.request, submission, Utc::now());
    (status, Html(html))
}

/// Only a lost connection fails the page; catalog errors render inline
fn catalog_status<T>(catalog: &Result<T, CatalogError>) -> StatusCode {
    match catalog {
        Err(CatalogError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    }
}
