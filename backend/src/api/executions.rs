//! Execution history API handlers

use crate::api::MessageResponse;
use crate::dispatch::{AgentExecution, ExecutionStats};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Executions list response
#[derive(Debug, Serialize)]
pub struct ExecutionsListResponse {
    /// Records, most recent first
    pub executions: Vec<AgentExecution>,
    /// Total number of records
    pub count: usize,
}

/// GET /api/executions - History, most recent first
pub async fn list_executions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExecutionsListResponse>, AppError> {
    let executions = state.history.list();
    Ok(Json(ExecutionsListResponse {
        count: executions.len(),
        executions,
    }))
}

/// GET /api/executions/:id - One record
pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentExecution>, AppError> {
    let uuid = Uuid::parse_str(&id)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid execution id: {}", id)))?;

    state
        .history
        .get(uuid)
        .map(Json)
        .ok_or(AppError::ExecutionNotFound(id))
}

/// DELETE /api/executions - Clear the history
pub async fn clear_executions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.history.len();
    state.history.clear();
    tracing::info!(removed, "Execution history cleared");
    Ok(Json(MessageResponse::ok(format!(
        "Cleared {} executions",
        removed
    ))))
}

/// GET /api/executions/stats - Derived statistics
pub async fn execution_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExecutionStats>, AppError> {
    Ok(Json(state.history.stats()))
}
