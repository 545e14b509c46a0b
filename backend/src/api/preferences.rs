//! Preference API handlers

use crate::error::AppError;
use crate::state::preferences::SUPPORTED_LANGUAGES;
use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Target language response
#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    /// Selected target language
    pub language: String,
    /// Languages offered by the selector
    pub supported: Vec<String>,
}

/// Target language update
#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    /// New target language
    pub language: String,
}

fn language_response(state: &AppState) -> LanguageResponse {
    LanguageResponse {
        language: state.preferences.selected_language(),
        supported: SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect(),
    }
}

/// GET /api/preferences/language
pub async fn get_language(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LanguageResponse>, AppError> {
    Ok(Json(language_response(&state)))
}

/// PUT /api/preferences/language
pub async fn set_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<LanguageResponse>, AppError> {
    let preferences = Arc::clone(&state.preferences);
    let language = request.language.clone();
    tokio::task::spawn_blocking(move || preferences.set_selected_language(&language))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Preference write task failed: {}", e))
        })??;
    tracing::info!(language = %request.language, "Target language updated");
    Ok(Json(language_response(&state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_language_defaults_and_updates() {
        let fixture = test_state();

        let current = get_language(State(fixture.state.clone())).await.unwrap();
        assert_eq!(current.language, "German");
        assert_eq!(current.supported.len(), 6);

        let updated = set_language(
            State(fixture.state.clone()),
            Json(LanguageRequest {
                language: "Spanish".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.language, "Spanish");

        let reloaded =
            crate::state::PreferenceStore::load(fixture.state.preferences.path(), "German")
                .unwrap();
        assert_eq!(reloaded.selected_language(), "Spanish");
    }

    #[tokio::test]
    async fn test_blank_language_is_bad_request() {
        let fixture = test_state();
        let result = set_language(
            State(fixture.state.clone()),
            Json(LanguageRequest {
                language: String::new(),
            }),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
