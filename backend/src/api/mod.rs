//! API module
//!
//! HTTP request handlers and the route table of the daemon.

pub mod agents;
pub mod events;
pub mod executions;
pub mod preferences;
pub mod surfaces;

use crate::state::AppState;
use crate::websocket;
use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy`
    pub status: String,
    /// Crate version
    pub version: String,
    /// Number of registered agents
    pub agents: usize,
    /// Shortcuts currently registered with the OS
    pub bound_shortcuts: Vec<String>,
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator (e.g., "ok", "error")
    pub status: String,
}

impl MessageResponse {
    /// `ok` message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "ok".to_string(),
        }
    }
}

/// GET /api/health - Health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agents: state.registry.agents().len(),
        bound_shortcuts: state.router.bound_shortcuts(),
    })
}

/// Route table, without middleware
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // Agents and dispatch
        .route("/api/agents", get(agents::list_agents))
        .route("/api/agents/dispatch", post(agents::dispatch))
        .route(
            "/api/shortcuts/:shortcut/activate",
            post(agents::activate_shortcut),
        )
        // Execution history
        .route(
            "/api/executions",
            get(executions::list_executions).delete(executions::clear_executions),
        )
        .route("/api/executions/stats", get(executions::execution_stats))
        .route("/api/executions/:id", get(executions::get_execution))
        // Preferences
        .route(
            "/api/preferences/language",
            get(preferences::get_language).put(preferences::set_language),
        )
        // Surfaces and devices
        .route("/api/audio/devices", get(surfaces::list_audio_devices))
        .route("/api/surfaces/translate", post(surfaces::translate_stream))
        .route("/api/surfaces/summarize", post(surfaces::summarize))
        // Presentation feed
        .route("/api/events", get(events::poll_events))
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
}
