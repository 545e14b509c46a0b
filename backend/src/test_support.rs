//! In-memory collaborators for unit tests

use crate::collaborators::{
    AudioBackend, Clipboard, HotkeyBinder, ServiceError, SummarizationService,
    TranslationResponse, TranslationService,
};
use crate::config::Config;
use crate::state::{AppState, PreferenceStore, Services};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Translation that prefixes the target language
pub struct FakeTranslation;

#[async_trait]
impl TranslationService for FakeTranslation {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TranslationResponse, ServiceError> {
        Ok(TranslationResponse::translated(format!(
            "[{}] {}",
            target_language, text
        )))
    }
}

/// Summarization that reports the input length
pub struct FakeSummaries;

#[async_trait]
impl SummarizationService for FakeSummaries {
    async fn summarize(&self, text: &str, _api_key: &str) -> Result<String, ServiceError> {
        Ok(format!("summary of {} chars", text.len()))
    }
}

/// Recorder that captures nothing
pub struct SilentRecorder;

#[async_trait]
impl AudioBackend for SilentRecorder {
    async fn start_recording(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn stop_recording(&self) -> Result<Vec<u8>, ServiceError> {
        Ok(Vec::new())
    }

    async fn transcribe(&self, _audio: &[u8]) -> Result<String, ServiceError> {
        Ok(String::new())
    }

    async fn list_devices(&self) -> Result<Vec<String>, ServiceError> {
        Ok(vec!["Built-in Microphone".to_string()])
    }
}

/// Clipboard held in memory
#[derive(Default)]
pub struct MemoryClipboard {
    /// Current contents
    pub text: Mutex<Option<String>>,
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn read_text(&self) -> Result<Option<String>, ServiceError> {
        Ok(self.text.lock().unwrap().clone())
    }

    async fn write_text(&self, text: &str) -> Result<(), ServiceError> {
        *self.text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// Binder that accepts everything
pub struct AcceptingHotkeys;

impl HotkeyBinder for AcceptingHotkeys {
    fn register(&self, _shortcut: &str) -> Result<(), ServiceError> {
        Ok(())
    }

    fn unregister(&self, _shortcut: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// App state over fakes, with preferences in a temporary directory
pub struct TestState {
    /// The state
    pub state: Arc<AppState>,
    /// Clipboard used by the router
    pub clipboard: Arc<MemoryClipboard>,
    _dir: TempDir,
}

/// Build an [`AppState`] over in-memory collaborators
pub fn test_state() -> TestState {
    let dir = TempDir::new().unwrap();
    let mut config = Config::from_env();
    config.persistence.data_dir = dir.path().to_path_buf();
    config.llm.default_target_language = "German".to_string();
    config.shortcuts.translator = "cmd+t".to_string();
    config.shortcuts.summarizer = "cmd+s".to_string();
    config.shortcuts.recorder = "cmd+r".to_string();
    config.shortcuts.translation_surface = true;
    config.shortcuts.summarizer_surface = false;
    config.shortcuts.debounce_ms = 1000;

    let clipboard = Arc::new(MemoryClipboard::default());
    let services = Services {
        translation: Arc::new(FakeTranslation),
        summarization: Arc::new(FakeSummaries),
        audio: Arc::new(SilentRecorder),
        clipboard: clipboard.clone(),
        hotkeys: Arc::new(AcceptingHotkeys),
    };
    let preferences = PreferenceStore::load(config.preferences_path(), "German").unwrap();

    TestState {
        state: Arc::new(AppState::new(&config, services, preferences)),
        clipboard,
        _dir: dir,
    }
}
