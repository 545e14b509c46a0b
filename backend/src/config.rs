//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Language model backend configuration
    pub llm: LlmConfig,
    /// Native recorder service configuration
    pub recorder: RecorderConfig,
    /// Shortcut configuration
    pub shortcuts: ShortcutConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Base directory for storing preferences
    pub data_dir: PathBuf,
}

/// Language model backend configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// API key for translation and transcription
    pub api_key: Option<String>,
    /// Credential handed to the summarizer
    pub summarizer_api_key: Option<String>,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Chat completion model
    pub model: String,
    /// Speech-to-text model
    pub transcription_model: String,
    /// Timeout for every outgoing HTTP request
    pub timeout_secs: u64,
    /// Language used when no preference was saved
    pub default_target_language: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "summarizer_api_key",
                &self.summarizer_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("transcription_model", &self.transcription_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("default_target_language", &self.default_target_language)
            .finish()
    }
}

/// Native recorder service configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Base URL of the recorder service
    pub url: String,
}

/// Shortcut configuration
#[derive(Debug, Clone)]
pub struct ShortcutConfig {
    /// Translator shortcut
    pub translator: String,
    /// Summarizer shortcut
    pub summarizer: String,
    /// Audio recorder shortcut
    pub recorder: String,
    /// Debounce window in milliseconds
    pub debounce_ms: u64,
    /// Register shortcuts with the OS
    pub hotkeys_enabled: bool,
    /// Translator shortcut opens the translation surface
    pub translation_surface: bool,
    /// Summarizer shortcut opens the summary surface
    pub summarizer_surface: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let api_key = non_empty_var("OPENAI_API_KEY");
        Self {
            server: ServerConfig {
                port: parsed_var("PORT", 8787),
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir: env::var_os("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| {
                        // Default to ~/.hotkey-agents or current directory
                        match env::var_os("HOME") {
                            Some(home) => PathBuf::from(home).join(".hotkey-agents"),
                            None => PathBuf::from(".hotkey-agents"),
                        }
                    }),
            },
            llm: LlmConfig {
                summarizer_api_key: non_empty_var("SUMMARIZER_API_KEY").or_else(|| api_key.clone()),
                api_key,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                transcription_model: env::var("TRANSCRIPTION_MODEL")
                    .unwrap_or_else(|_| "whisper-1".to_string()),
                timeout_secs: parsed_var("HTTP_TIMEOUT_SECS", 60),
                default_target_language: env::var("DEFAULT_TARGET_LANGUAGE")
                    .unwrap_or_else(|_| "German".to_string()),
            },
            recorder: RecorderConfig {
                url: env::var("RECORDER_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:8788".to_string()),
            },
            shortcuts: ShortcutConfig {
                translator: env::var("TRANSLATOR_SHORTCUT").unwrap_or_else(|_| "cmd+t".to_string()),
                summarizer: env::var("SUMMARIZER_SHORTCUT").unwrap_or_else(|_| "cmd+s".to_string()),
                recorder: env::var("RECORDER_SHORTCUT").unwrap_or_else(|_| "cmd+r".to_string()),
                debounce_ms: parsed_var("DEBOUNCE_MS", 1000),
                hotkeys_enabled: parsed_var("HOTKEYS_ENABLED", true),
                translation_surface: parsed_var("TRANSLATION_SURFACE", true),
                summarizer_surface: parsed_var("SUMMARIZER_SURFACE", false),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Path of the preferences file
    pub fn preferences_path(&self) -> PathBuf {
        self.persistence.data_dir.join("preferences.json")
    }

    /// Outgoing HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
