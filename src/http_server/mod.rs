//! # HTTP Server Module
//!
//! Serves the where-provenance panel over axum.
//!
//! # Endpoints
//!
//! - `/` - Panel page (GET shows the form, POST runs the query)
//! - `/api/catalog` - Rendered catalog as JSON
//! - `/api/query` - Annotated query result as JSON
//! - `/api/correlate` - Decode an annotation reference
//! - `/health` - Health check

pub mod api_routes;
pub mod config;
pub mod observability_routes;
pub mod page;
pub mod panel_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use page::{escape_html, render_page, Submission, DEFAULT_QUERY, EXAMPLE_QUERIES};
pub use panel_routes::PanelState;
pub use server::HttpServer;
