//! OpenAI-compatible API client
//!
//! Direct HTTP client for chat completions (translation, summarization) and
//! audio transcriptions. Any server speaking the OpenAI wire format works;
//! the base URL is configurable.

use crate::collaborators::{
    ensure_success, ServiceError, SummarizationService, TextStream, TranslationResponse,
    TranslationService,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default transcription model
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// SSE stream termination marker
const STREAM_DONE: &str = "[DONE]";

const TRANSLATION_TEMPERATURE: f32 = 0.3;
const SUMMARY_TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// One parsed line of a chat-completions event stream
#[derive(Debug, PartialEq, Eq)]
enum StreamLine {
    Content(String),
    Done,
    Skip,
}

fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.trim();
    if data == STREAM_DONE {
        return StreamLine::Done;
    }

    serde_json::from_str::<StreamChunk>(data)
        .ok()
        .and_then(|chunk| chunk.choices.into_iter().next())
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(StreamLine::Skip, StreamLine::Content)
}

fn translation_prompt(target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the given text to {}. \
         Only respond with the translation, no explanations or additional text.",
        target_language
    )
}

fn summary_prompt() -> String {
    "You are a helpful assistant that writes concise summaries. Summarize the given \
     text in a few sentences, keeping the key facts. Only respond with the summary."
        .to_string()
}

/// Client for an OpenAI-compatible API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    transcription_model: String,
}

impl OpenAiClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (connection pooling, timeouts)
    /// * `base_url` - API base URL without trailing slash, e.g. `https://api.openai.com/v1`
    /// * `api_key` - Default credential used for translation and transcription
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }

    /// Use a different chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different transcription model
    pub fn with_transcription_model(mut self, model: impl Into<String>) -> Self {
        self.transcription_model = model.into();
        self
    }

    fn chat_request(&self, system: String, user: &str, temperature: f32, stream: bool) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature,
            max_tokens: MAX_TOKENS,
            stream,
        }
    }

    async fn send_chat(
        &self,
        api_key: &str,
        request: &ChatRequest<'_>,
    ) -> Result<reqwest::Response, ServiceError> {
        if api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            url = %url,
            model = %request.model,
            stream = request.stream,
            "Calling chat completions"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;
        ensure_success(response).await
    }

    /// Run a non-streaming chat completion and return the first choice's text
    async fn complete(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<String, ServiceError> {
        let response = self.send_chat(api_key, request).await?;
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse JSON response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse("No content in response".to_string()))?;

        tracing::debug!(response_len = content.len(), "Chat completion received");
        Ok(content)
    }

    /// Transcribe audio (WAV or any format the API accepts)
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("recording.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        let url = format!("{}/audio/transcriptions", self.base_url);
        tracing::debug!(url = %url, audio_len = audio.len(), "Uploading audio for transcription");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse transcription: {}", e))
        })?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl TranslationService for OpenAiClient {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TranslationResponse, ServiceError> {
        let request = self.chat_request(
            translation_prompt(target_language),
            text,
            TRANSLATION_TEMPERATURE,
            false,
        );

        match self.complete(&self.api_key, &request).await {
            Ok(content) => Ok(TranslationResponse::translated(content)),
            Err(e) => {
                tracing::warn!(error = %e, "Translation request failed");
                Ok(TranslationResponse::failed(e.to_string()))
            }
        }
    }

    async fn translate_stream(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TextStream, ServiceError> {
        let request = self.chat_request(
            translation_prompt(target_language),
            text,
            TRANSLATION_TEMPERATURE,
            true,
        );
        let response = self.send_chat(&self.api_key, &request).await?;
        let mut bytes = response.bytes_stream();

        let chunks = async_stream::stream! {
            let mut pending: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => pending.extend_from_slice(&chunk),
                    Err(e) => {
                        yield Err(ServiceError::Http(e));
                        return;
                    }
                }

                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    match parse_stream_line(line.trim()) {
                        StreamLine::Content(content) => yield Ok(content),
                        StreamLine::Done => return,
                        StreamLine::Skip => {}
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}

#[async_trait]
impl SummarizationService for OpenAiClient {
    async fn summarize(&self, text: &str, api_key: &str) -> Result<String, ServiceError> {
        let request = self.chat_request(summary_prompt(), text, SUMMARY_TEMPERATURE, false);
        self.complete(api_key, &request).await
    }
}
