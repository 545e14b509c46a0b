//! Surface API handlers
//!
//! The translation and summary surfaces perform their own backend requests,
//! independent of the dispatcher and the execution history.

use crate::error::AppError;
use crate::state::AppState;
use async_stream::stream;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Json, Response},
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// SSE stream termination marker
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// Prefix of an SSE error event
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Translation surface request
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Text to translate
    pub text: String,
    /// Target language; the saved preference when absent
    #[serde(default)]
    pub target_language: Option<String>,
}

/// Summary surface request
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Text to summarize
    pub text: String,
}

/// Summary surface response
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    /// The summary
    pub summary: String,
}

/// Audio device list response
#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    /// Capture device names
    pub devices: Vec<String>,
}

/// POST /api/surfaces/translate - Stream a translation as SSE
///
/// Each `data:` event carries a JSON-encoded text chunk. The stream ends with
/// `data: [DONE]`, or `data: [ERROR] <message>` on failure.
pub async fn translate_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Response, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "No text provided for translation".to_string(),
        ));
    }

    let target_language = request
        .target_language
        .filter(|language| !language.trim().is_empty())
        .unwrap_or_else(|| state.preferences.selected_language());

    tracing::info!(
        target_language = %target_language,
        text_len = request.text.len(),
        "Streaming translation"
    );

    let translation = Arc::clone(&state.translation);
    let text = request.text;
    let events = stream! {
        match translation.translate_stream(&text, &target_language).await {
            Ok(mut chunks) => {
                let mut failed = false;
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(chunk) => {
                            let encoded = serde_json::to_string(&chunk)
                                .unwrap_or_else(|_| "\"\"".to_string());
                            yield format!("data: {}\n\n", encoded);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Translation stream failed");
                            yield format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e);
                            failed = true;
                            break;
                        }
                    }
                }
                if !failed {
                    yield format!("data: {}\n\n", SSE_DONE_SIGNAL);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start translation stream");
                yield format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e);
            }
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(events.map(Ok::<_, std::io::Error>)))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// POST /api/surfaces/summarize - Summarize text for the summary surface
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "No text found in clipboard to summarize".to_string(),
        ));
    }

    let summary = state
        .summarization
        .summarize(&request.text, &state.summarizer_api_key)
        .await?;
    Ok(Json(SummarizeResponse { summary }))
}

/// GET /api/audio/devices - List capture devices
pub async fn list_audio_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DevicesResponse>, AppError> {
    let devices = state.audio.list_devices().await?;
    Ok(Json(DevicesResponse { devices }))
}
