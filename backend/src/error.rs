//! Error types and error handling for the application
//!
//! `AppError` is what HTTP handlers return. It renders as a JSON body
//! `{ "error": ..., "status": ... }` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Execution with the given ID was not found
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    /// The request was malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error occurred during preference persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),

    /// A collaborator call failed
    #[error("Service error: {0}")]
    Service(#[from] crate::collaborators::ServiceError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ExecutionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(crate::state::PersistenceError::InvalidData(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Service(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
