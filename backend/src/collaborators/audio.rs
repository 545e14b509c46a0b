//! Audio backend client
//!
//! Capture is owned by a native recorder service reached over HTTP; speech to
//! text goes through the OpenAI-compatible transcription endpoint.

use crate::collaborators::{ensure_success, AudioBackend, OpenAiClient, ServiceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Reply of the recorder service's start/stop endpoints
#[derive(Debug, Deserialize)]
struct RecordingResult {
    success: bool,
    #[serde(default)]
    audio_data: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

/// [`AudioBackend`] backed by a recorder service and a transcription API
pub struct HttpAudioBackend {
    client: reqwest::Client,
    recorder_url: String,
    transcriber: Arc<OpenAiClient>,
}

impl HttpAudioBackend {
    /// Create a backend talking to the recorder at `recorder_url`
    pub fn new(
        client: reqwest::Client,
        recorder_url: impl Into<String>,
        transcriber: Arc<OpenAiClient>,
    ) -> Self {
        Self {
            client,
            recorder_url: recorder_url.into().trim_end_matches('/').to_string(),
            transcriber,
        }
    }

    async fn recording_call(&self, action: &str) -> Result<RecordingResult, ServiceError> {
        let url = format!("{}/recording/{}", self.recorder_url, action);
        tracing::debug!(url = %url, "Calling recorder service");

        let response = self.client.post(&url).send().await?;
        let response = ensure_success(response).await?;
        let result: RecordingResult = response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse recorder reply: {}", e))
        })?;

        if !result.success {
            return Err(ServiceError::Unavailable(result.error.unwrap_or_else(|| {
                format!("Recorder could not {} recording", action)
            })));
        }
        Ok(result)
    }
}

#[async_trait]
impl AudioBackend for HttpAudioBackend {
    async fn start_recording(&self) -> Result<(), ServiceError> {
        self.recording_call("start").await?;
        tracing::info!("Audio recording started");
        Ok(())
    }

    async fn stop_recording(&self) -> Result<Vec<u8>, ServiceError> {
        let result = self.recording_call("stop").await?;
        let audio = result.audio_data.unwrap_or_default();
        tracing::info!(audio_len = audio.len(), "Audio recording stopped");
        Ok(audio)
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String, ServiceError> {
        self.transcriber.transcribe(audio).await
    }

    async fn list_devices(&self) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/devices", self.recorder_url);
        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response).await?;
        response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse device list: {}", e))
        })
    }
}
