//! Summarizer agent

use crate::agents::{Agent, AgentConfig, AgentError, ExecutionContext, ExecutionResult};
use crate::collaborators::SummarizationService;
use async_trait::async_trait;
use std::sync::Arc;

/// Default shortcut of the summarizer
pub const DEFAULT_SHORTCUT: &str = "cmd+s";

/// Summarizes its input using the summarization collaborator and its own
/// API credential.
pub struct SummarizerAgent {
    config: AgentConfig,
    service: Arc<dyn SummarizationService>,
    api_key: String,
}

impl SummarizerAgent {
    /// Create a summarizer on [`DEFAULT_SHORTCUT`]
    pub fn new(service: Arc<dyn SummarizationService>, api_key: impl Into<String>) -> Self {
        Self {
            config: AgentConfig::new(
                "Clipboard Summarizer",
                "Summarize clipboard text content using AI",
                DEFAULT_SHORTCUT,
            ),
            service,
            api_key: api_key.into(),
        }
    }

    /// Bind to a different shortcut
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.config.shortcut = shortcut.into();
        self
    }
}

#[async_trait]
impl Agent for SummarizerAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn execute(&self, context: &ExecutionContext) -> Result<ExecutionResult, AgentError> {
        if context.input.trim().is_empty() {
            return Ok(ExecutionResult::failure(
                "No text found in clipboard to summarize",
            ));
        }

        tracing::info!(input_len = context.input.len(), "Summarizing text");

        let result = match self.service.summarize(&context.input, &self.api_key).await {
            Ok(summary) => ExecutionResult::success(summary),
            Err(e) => ExecutionResult::failure(format!("Failed to summarize text: {}", e)),
        };
        Ok(result)
    }
}
