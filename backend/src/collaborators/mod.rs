//! External collaborators
//!
//! Everything the agent core depends on but does not implement: the language
//! model backend, the native audio recorder, the system clipboard, the OS
//! hotkey facility and the presentation layer. Each concern is a narrow trait
//! so the core can be exercised with in-memory fakes.

pub mod audio;
pub mod clipboard;
pub mod hotkeys;
pub mod openai;
pub mod presentation;

pub use audio::HttpAudioBackend;
pub use clipboard::SystemClipboard;
pub use hotkeys::{GlobalHotkeyBinder, InactiveHotkeyBinder};
pub use openai::OpenAiClient;
pub use presentation::{
    FeedEntry, Notification, NotificationLevel, PresentationEvent, PresentationFeed,
    SurfaceKind, SurfaceRequest,
};

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by collaborator calls
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport-level failure (connection refused, timeout, TLS, ...)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote side answered with a non-success HTTP status
    #[error("HTTP error {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The remote side answered but the payload was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No API credential was configured for the call
    #[error("API key is missing")]
    MissingApiKey,

    /// System clipboard access failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Hotkey registration failed
    #[error("Hotkey error: {0}")]
    Hotkey(String),

    /// The collaborator reported a failure of its own
    #[error("{0}")]
    Unavailable(String),
}

/// Stream of text chunks produced by a streaming collaborator call
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ServiceError>> + Send>>;

/// Response shape of the translation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    /// Whether the translation succeeded
    pub success: bool,
    /// Translated text, present on success
    pub translated_text: Option<String>,
    /// Error message, present on failure
    pub error: Option<String>,
}

impl TranslationResponse {
    /// Successful translation
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            success: true,
            translated_text: Some(text.into()),
            error: None,
        }
    }

    /// Failed translation
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            translated_text: None,
            error: Some(error.into()),
        }
    }
}

/// Translates text into a target language
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate `text` into `target_language`
    ///
    /// Backend failures are reported inside the response (`success: false`);
    /// `Err` is reserved for failures that prevent producing a response at all.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TranslationResponse, ServiceError>;

    /// Translate `text`, yielding the translation incrementally
    ///
    /// The default implementation yields the whole translation as one chunk.
    async fn translate_stream(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TextStream, ServiceError> {
        let response = self.translate(text, target_language).await?;
        let chunk = if response.success {
            Ok(response.translated_text.unwrap_or_default())
        } else {
            Err(ServiceError::Unavailable(
                response
                    .error
                    .unwrap_or_else(|| "Translation failed".to_string()),
            ))
        };
        Ok(Box::pin(stream::once(async move { chunk })))
    }
}

/// Summarizes text using a credential supplied by the caller
#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Summarize `text`, authenticating with `api_key`
    async fn summarize(&self, text: &str, api_key: &str) -> Result<String, ServiceError>;
}

/// Native audio capture and speech-to-text
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Begin capturing audio
    async fn start_recording(&self) -> Result<(), ServiceError>;

    /// Stop capturing and return the captured audio (may be empty)
    async fn stop_recording(&self) -> Result<Vec<u8>, ServiceError>;

    /// Convert captured audio into text
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ServiceError>;

    /// Names of the available capture devices
    async fn list_devices(&self) -> Result<Vec<String>, ServiceError>;
}

/// System clipboard access
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Current clipboard text, `None` when the clipboard holds no text
    async fn read_text(&self) -> Result<Option<String>, ServiceError>;

    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<(), ServiceError>;
}

/// OS-level global shortcut registration
///
/// Activations of registered shortcuts are delivered out of band (see
/// [`GlobalHotkeyBinder::spawn`]); this trait only manages the bindings.
pub trait HotkeyBinder: Send + Sync {
    /// Register a shortcut such as `cmd+t`
    fn register(&self, shortcut: &str) -> Result<(), ServiceError>;

    /// Remove a previously registered shortcut
    fn unregister(&self, shortcut: &str) -> Result<(), ServiceError>;
}

/// Display side of the shell: transient notifications and dedicated surfaces
#[async_trait]
pub trait PresentationSink: Send + Sync {
    /// Show a transient notification
    fn notify(&self, notification: Notification);

    /// Open a dedicated surface that performs its own backend request
    async fn open_surface(&self, request: SurfaceRequest) -> Result<(), ServiceError>;
}

/// Turn a non-success HTTP response into [`ServiceError::Status`]
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    tracing::error!(
        status_code = status.as_u16(),
        error_body = %body,
        "Collaborator returned error status"
    );
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}
