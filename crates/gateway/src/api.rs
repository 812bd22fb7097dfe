//! Query API.
//!
//! Endpoints:
//!
//! - `POST   /api/query`        — Answer a question within a session
//! - `GET    /api/load`         — Conversation history of a session
//! - `DELETE /api/history`      — Clear a session's conversation
//! - `POST   /api/route/debug`  — Routing decision and system prompt, no answer
//!
//! Every endpoint takes an optional `session_id`; requests without one use
//! the `"default"` session.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use helpline_core::{ChatMessage, ConversationWindow};
use helpline_engine::RoutingPlan;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{DEFAULT_SESSION, SharedState};

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub session_id: String,
    pub category: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub session_id: String,
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct RouteDebugResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub plan: RoutingPlan,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn session_id(raw: Option<String>) -> String {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}

/// The trimmed, non-blank query of a request.
fn require_query(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("Missing or empty 'query' in request body."))
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn query_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let query = require_query(payload.query)?;
    let session_id = session_id(payload.session_id);
    info!(session = %session_id, "Query received");

    let routed = state
        .router
        .answer_in_session(&state.sessions, &session_id, &query)
        .await
        .map_err(|e| {
            warn!(session = %session_id, error = %e, "Query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to answer query ({})", e.diagnostic()),
                }),
            )
        })?;

    Ok(Json(QueryResponse {
        answer: routed.answer,
        session_id,
        category: routed.plan.category,
        context: routed.plan.context,
    }))
}

pub async fn load_handler(
    State(state): State<SharedState>,
    Query(params): Query<SessionParams>,
) -> Json<HistoryResponse> {
    let session_id = session_id(params.session_id);
    let history = state.sessions.history(&session_id).await;
    Json(HistoryResponse {
        session_id,
        history,
    })
}

pub async fn reset_handler(
    State(state): State<SharedState>,
    Query(params): Query<SessionParams>,
) -> Json<ResetResponse> {
    let session_id = session_id(params.session_id);
    let cleared = state.sessions.reset(&session_id).await;
    info!(session = %session_id, cleared, "History reset");
    Json(ResetResponse {
        session_id,
        cleared,
    })
}

/// Classify and assemble the prompt exactly as a real query would, but
/// skip the answer call and leave the session untouched.
pub async fn route_debug_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<RouteDebugResponse>, ApiError> {
    let query = require_query(payload.query)?;
    let session_id = session_id(payload.session_id);

    let result = match state.sessions.get(&session_id).await {
        Some(window) => {
            let window = window.lock().await;
            state.router.plan(&query, &window).await
        }
        None => state.router.plan(&query, &ConversationWindow::default()).await,
    };

    let plan = result.map_err(|e| {
        warn!(session = %session_id, error = %e, "Route debug failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to route query ({})", e.diagnostic()),
            }),
        )
    })?;

    Ok(Json(RouteDebugResponse { session_id, plan }))
}
