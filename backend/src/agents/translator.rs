//! Translator agent

use crate::agents::{
    Agent, AgentConfig, AgentError, ExecutionContext, ExecutionResult, TARGET_LANGUAGE_KEY,
};
use crate::collaborators::TranslationService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Default shortcut of the translator
pub const DEFAULT_SHORTCUT: &str = "cmd+t";

/// Translates its input into the language named by the `targetLanguage`
/// metadata, falling back to a configured default.
pub struct TranslatorAgent {
    config: AgentConfig,
    service: Arc<dyn TranslationService>,
    default_language: String,
}

impl TranslatorAgent {
    /// Create a translator on [`DEFAULT_SHORTCUT`]
    pub fn new(service: Arc<dyn TranslationService>, default_language: impl Into<String>) -> Self {
        Self {
            config: AgentConfig::new(
                "Translator",
                "Translate clipboard or selected text to a preferred language",
                DEFAULT_SHORTCUT,
            ),
            service,
            default_language: default_language.into(),
        }
    }

    /// Bind to a different shortcut
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.config.shortcut = shortcut.into();
        self
    }
}

#[async_trait]
impl Agent for TranslatorAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn execute(&self, context: &ExecutionContext) -> Result<ExecutionResult, AgentError> {
        if context.input.trim().is_empty() {
            return Ok(ExecutionResult::failure("No text provided for translation"));
        }

        let target_language = context
            .metadata_str(TARGET_LANGUAGE_KEY)
            .unwrap_or(&self.default_language);

        info!(
            target_language = %target_language,
            input_len = context.input.len(),
            "Translating text"
        );

        let result = match self.service.translate(&context.input, target_language).await {
            Ok(response) if response.success => match response.translated_text {
                Some(text) if !text.trim().is_empty() => ExecutionResult::success(text),
                _ => ExecutionResult::failure("Translation failed: empty response"),
            },
            Ok(response) => ExecutionResult::failure(format!(
                "Translation failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            )),
            Err(e) => ExecutionResult::failure(format!("Translation failed: {}", e)),
        };
        Ok(result)
    }
}
