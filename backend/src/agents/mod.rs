//! Agents
//!
//! An agent is a named, shortcut-bound unit of work. The registry owns agents
//! for the lifetime of the process and runs them through the [`Agent`] trait;
//! everything an agent needs from the outside world comes in through the
//! collaborator traits it was constructed with.

pub mod audio_recorder;
pub mod summarizer;
pub mod translator;

pub use audio_recorder::AudioRecorderAgent;
pub use summarizer::SummarizerAgent;
pub use translator::TranslatorAgent;

use crate::collaborators::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Metadata key carrying the translation target language
pub const TARGET_LANGUAGE_KEY: &str = "targetLanguage";

/// Metadata key describing where the input came from
pub const SOURCE_KEY: &str = "source";

/// Input passed to agents that are triggered without clipboard text
pub const TOGGLE_INPUT: &str = "[audio toggle]";

/// Static configuration of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique display label
    pub name: String,
    /// What the agent does, shown in the GUI
    pub description: String,
    /// Unique routing key, e.g. `cmd+t`
    pub shortcut: String,
    /// Disabled agents stay registered but refuse to run
    pub enabled: bool,
    /// Whether the routing shim feeds the clipboard text as input
    pub clipboard_input: bool,
}

impl AgentConfig {
    /// Enabled configuration that reads its input from the clipboard
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        shortcut: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            shortcut: shortcut.into(),
            enabled: true,
            clipboard_input: true,
        }
    }

    /// Mark the agent disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Trigger the agent with [`TOGGLE_INPUT`] instead of clipboard text
    pub fn without_clipboard_input(mut self) -> Self {
        self.clipboard_input = false;
        self
    }

    /// Validate the configuration
    /// Returns Ok(()) if valid, Err with message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Agent name cannot be empty".to_string());
        }
        if self.shortcut.trim().is_empty() {
            return Err("Agent shortcut cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Per-invocation input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Text payload (clipboard text, or [`TOGGLE_INPUT`])
    pub input: String,
    /// Open metadata such as [`SOURCE_KEY`] and [`TARGET_LANGUAGE_KEY`]
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Context with no metadata
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata entry as a string, if present and a string
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Outcome of an agent run
///
/// Exactly one of output/error is present: successes carry output, failures
/// carry an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ExecutionResult {
    /// Successful result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    /// Failed result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Output text of a successful run
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Error message of a failed run
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fault escaping an agent's `execute`
///
/// Agents report their own failures as [`ExecutionResult::failure`]. An
/// `AgentError` means the agent could not produce a result at all; the
/// dispatcher records it and synthesizes a failure for the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A collaborator call failed and the agent chose not to handle it
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Any other internal fault
    #[error("{0}")]
    Internal(String),
}

/// A shortcut-bound unit of work
#[async_trait]
pub trait Agent: Send + Sync {
    /// Static configuration
    fn config(&self) -> &AgentConfig;

    /// Run the agent
    ///
    /// Concurrent calls on the same instance are the caller's responsibility
    /// to serialize.
    async fn execute(&self, context: &ExecutionContext) -> Result<ExecutionResult, AgentError>;

    /// Display name
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Routing key
    fn shortcut(&self) -> &str {
        &self.config().shortcut
    }

    /// Whether the agent may run
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_builders() {
        let config = AgentConfig::new("Recorder", "Records audio", "cmd+r")
            .without_clipboard_input()
            .disabled();
        assert!(!config.enabled);
        assert!(!config.clipboard_input);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_agent_config_validate() {
        let mut config = AgentConfig::new("Translator", "", "cmd+t");
        assert!(config.validate().is_ok());

        config.shortcut = " ".to_string();
        assert!(config.validate().is_err());

        config.shortcut = "cmd+t".to_string();
        config.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_execution_result_exactly_one_of() {
        let ok = ExecutionResult::success("done");
        assert!(ok.is_success());
        assert_eq!(ok.output(), Some("done"));
        assert!(ok.error().is_none());

        let failed = ExecutionResult::failure("boom");
        assert!(!failed.is_success());
        assert!(failed.output().is_none());
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn test_execution_result_serialization_omits_absent_field() {
        let json = serde_json::to_value(ExecutionResult::failure("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn test_context_metadata() {
        let context = ExecutionContext::new("Hello")
            .with_metadata(SOURCE_KEY, "clipboard")
            .with_metadata("count", 3);
        assert_eq!(context.metadata_str(SOURCE_KEY), Some("clipboard"));
        assert_eq!(context.metadata_str("count"), None);
        assert_eq!(context.metadata_str("missing"), None);
    }
}
