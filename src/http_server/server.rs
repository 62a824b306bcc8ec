//! # HTTP Server
//!
//! Main HTTP server combining the panel page, the JSON API and the health
//! check.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::api_routes::api_routes;
use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::panel_routes::{panel_routes, PanelState};
use crate::engine::ProvenanceEngine;
use crate::observability::{log_event_with_fields, Event};

/// HTTP Server for the where-provenance panel
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an already connected engine
    pub fn with_engine(config: HttpServerConfig, engine: Arc<dyn ProvenanceEngine>) -> Self {
        let router = Self::build_router(&config, engine);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, engine: Arc<dyn ProvenanceEngine>) -> Router {
        let state = Arc::new(PanelState::new(engine));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(panel_routes(state.clone()))
            .nest("/api", api_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(
            Event::Serving,
            &[("addr", addr.to_string().as_str()), ("health", "/health")],
        );
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::engine::{MemoryEngine, MemoryRelation, ResultSet};

    fn engine() -> MemoryEngine {
        MemoryEngine::new()
            .with_relation(
                MemoryRelation::new("personnel", &["name", "city"])
                    .row("t1", &["John", "Paris"])
                    .row("t2", &["Paul", "Paris"]),
            )
            .with_result(
                "SELECT distinct city FROM personnel",
                ResultSet::new(
                    vec!["city".into(), "where_provenance".into()],
                    vec![vec![
                        Some("Paris".into()),
                        Some("((personnel:t1:2;personnel:t2:2))".into()),
                    ]],
                ),
            )
            .with_failure("SELECT * FORM personnel", "syntax error at or near \"FORM\"")
    }

    fn router() -> Router {
        HttpServer::with_engine(HttpServerConfig::default(), Arc::new(engine())).router()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_server_socket_addr() {
        let server = HttpServer::with_engine(HttpServerConfig::with_port(9000), Arc::new(engine()));
        assert_eq!(server.socket_addr(), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_panel_renders_catalog() {
        let response = router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("id=\"personnel:t2:2\""));
        assert!(!html.contains("query result"));
    }

    #[tokio::test]
    async fn test_post_panel_renders_result() {
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("request=SELECT+distinct+city+FROM+personnel%3B"))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("data-where=\"personnel:t1:2 personnel:t2:2\""));
        assert!(html.contains(">Paris</td>"));
    }

    #[tokio::test]
    async fn test_post_panel_shows_query_failure() {
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("request=SELECT+*+FORM+personnel"))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("WHERE_USER_QUERY_FAILURE"));
        assert!(html.contains("id=\"personnel:t1:1\""));
    }

    #[tokio::test]
    async fn test_post_panel_runs_query_when_discovery_fails() {
        let engine = engine().with_discovery_failure("permission denied for table pg_attribute");
        let router = HttpServer::with_engine(HttpServerConfig::default(), Arc::new(engine)).router();
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("request=SELECT+distinct+city+FROM+personnel"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("WHERE_CATALOG_QUERY_FAILURE"));
        assert!(html.contains("query result"));
        assert!(html.contains(">Paris</td>"));
        assert!(!html.contains("id=\"personnel:t1:1\""));
    }

    #[tokio::test]
    async fn test_post_panel_skips_query_when_unreachable() {
        let router = HttpServer::with_engine(
            HttpServerConfig::default(),
            Arc::new(MemoryEngine::unreachable()),
        )
        .router();
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("request=SELECT+1"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = body_string(response).await;
        assert!(html.contains("WHERE_CONNECTION_FAILURE"));
        assert!(!html.contains("query result"));
    }

    #[tokio::test]
    async fn test_api_query_and_failure_status() {
        let request = Request::post("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"query":"SELECT * FORM personnel"}"#))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::post("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"query":"SELECT distinct city FROM personnel"}"#))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["columns"][0], "city");
        assert_eq!(json["rows"][0]["cells"][0]["reference"], "1 ((personnel:t1:2;personnel:t2:2))");
    }

    #[tokio::test]
    async fn test_api_catalog_unreachable_engine() {
        let router = HttpServer::with_engine(
            HttpServerConfig::default(),
            Arc::new(MemoryEngine::unreachable()),
        )
        .router();
        let response = router
            .oneshot(Request::get("/api/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_correlate() {
        let request = Request::post("/api/correlate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"reference":"1 ((personnel:t1:2))"}"#))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["identifiers"][0], "personnel:t1:2");
        assert_eq!(json["annotation"]["version"], 1);
    }
}
