//! HTTP API gateway for Helpline.
//!
//! Exposes the query router over REST: ask a question, load or clear a
//! session's conversation, and inspect a routing decision without
//! answering. Built on Axum.

pub mod api;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{Method, header},
    response::Json,
    routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use helpline_engine::SessionStore;

/// Session used when a request names none.
pub const DEFAULT_SESSION: &str = "default";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub router: Arc<helpline_engine::Router>,
    pub sessions: SessionStore,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(router: Arc<helpline_engine::Router>, sessions: SessionStore) -> SharedState {
        Arc::new(Self { router, sessions })
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS for browser front ends
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(home_handler))
        .route("/api", get(home_handler))
        .route("/health", get(health_handler))
        .route("/api/query", post(api::query_handler))
        .route("/api/load", get(api::load_handler))
        .route("/api/history", delete(api::reset_handler))
        .route("/api/route/debug", post(api::route_debug_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the provider and loads the data files once, then serves until
/// the process is stopped.
pub async fn start(config: helpline_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = helpline_providers::build_from_config(&config)?;
    let router = helpline_engine::Router::load(&config, provider)?;
    info!(
        knowledge = router.knowledge().len(),
        contexts = router.catalog().len(),
        model = %router.settings().model,
        "Router ready"
    );

    let sessions = SessionStore::new(config.history.max_messages, config.gateway.max_sessions);
    let app = build_router(GatewayState::new(Arc::new(router), sessions));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
    usage: &'static str,
}

async fn home_handler() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Helpline support API",
        usage: "POST /api/query with JSON body: {\"query\": \"your question\", \"session_id\": \"optional\"}",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use helpline_core::{ContextCatalog, CustomerContextStore, KnowledgeIndex};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let provider = Arc::new(api::tests::MockProvider::new(vec![]));
        let router = helpline_engine::Router::new(
            provider,
            Arc::new(KnowledgeIndex::default()),
            Arc::new(ContextCatalog::default()),
            Arc::new(CustomerContextStore::new()),
        );
        GatewayState::new(Arc::new(router), SessionStore::new(10, 10))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn home_and_api_describe_usage() {
        for uri in ["/", "/api"] {
            let app = build_router(test_state());
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(json["usage"].as_str().unwrap().contains("POST /api/query"));
        }
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let app = build_router(test_state());
        let query = "x".repeat(2 * 1024 * 1024);
        let body = serde_json::json!({ "query": query });

        let req = Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
