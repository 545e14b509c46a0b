// Application state
// Wires the registry, history, router, preferences and presentation feed together

use crate::agents::{AudioRecorderAgent, SummarizerAgent, TranslatorAgent};
use crate::collaborators::{
    AudioBackend, Clipboard, HotkeyBinder, HttpAudioBackend, OpenAiClient, PresentationEvent,
    PresentationFeed, SummarizationService, SurfaceKind, SystemClipboard, TranslationService,
};
use crate::config::Config;
use crate::dispatch::{AgentRegistry, ExecutionHistory};
use crate::routing::{RouterConfig, ShortcutRouter};
use crate::state::preferences::PreferenceStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// External collaborators the daemon runs against
#[derive(Clone)]
pub struct Services {
    /// Translation backend
    pub translation: Arc<dyn TranslationService>,
    /// Summarization backend
    pub summarization: Arc<dyn SummarizationService>,
    /// Recorder and speech-to-text
    pub audio: Arc<dyn AudioBackend>,
    /// System clipboard
    pub clipboard: Arc<dyn Clipboard>,
    /// OS shortcut registration
    pub hotkeys: Arc<dyn HotkeyBinder>,
}

impl Services {
    /// Production collaborators: OpenAI-compatible API, recorder service and
    /// the system clipboard
    pub fn live(config: &Config, client: reqwest::Client, hotkeys: Arc<dyn HotkeyBinder>) -> Self {
        let openai = Arc::new(
            OpenAiClient::new(
                client.clone(),
                config.llm.base_url.clone(),
                config.llm.api_key.clone().unwrap_or_default(),
            )
            .with_model(config.llm.model.clone())
            .with_transcription_model(config.llm.transcription_model.clone()),
        );
        let audio = Arc::new(HttpAudioBackend::new(
            client,
            config.recorder.url.clone(),
            Arc::clone(&openai),
        ));

        Self {
            translation: openai.clone(),
            summarization: openai,
            audio,
            clipboard: Arc::new(SystemClipboard::new()),
            hotkeys,
        }
    }
}

/// Shared daemon state handed to every HTTP handler
pub struct AppState {
    /// Execution history
    pub history: Arc<ExecutionHistory>,
    /// Agent registry and dispatcher
    pub registry: Arc<AgentRegistry>,
    /// Hotkey router
    pub router: Arc<ShortcutRouter>,
    /// User preferences
    pub preferences: Arc<PreferenceStore>,
    /// Presentation feed consumed by the GUI
    pub feed: Arc<PresentationFeed>,
    /// Translation backend, used directly by the translation surface
    pub translation: Arc<dyn TranslationService>,
    /// Summarization backend, used directly by the summary surface
    pub summarization: Arc<dyn SummarizationService>,
    /// Recorder backend, for device listing
    pub audio: Arc<dyn AudioBackend>,
    /// Credential for summary requests
    pub summarizer_api_key: String,
}

impl AppState {
    /// Build the state and register the built-in agents
    pub fn new(config: &Config, services: Services, preferences: PreferenceStore) -> Self {
        let history = Arc::new(ExecutionHistory::new());
        let feed = Arc::new(PresentationFeed::default());

        let listener_feed = Arc::clone(&feed);
        history.add_listener(move |execution| {
            listener_feed.publish(PresentationEvent::Execution(execution.clone()));
        });

        let summarizer_api_key = config.llm.summarizer_api_key.clone().unwrap_or_default();
        let registry = Arc::new(AgentRegistry::new(Arc::clone(&history)));
        registry.register(Arc::new(
            TranslatorAgent::new(
                Arc::clone(&services.translation),
                config.llm.default_target_language.clone(),
            )
            .with_shortcut(config.shortcuts.translator.clone()),
        ));
        registry.register(Arc::new(
            SummarizerAgent::new(
                Arc::clone(&services.summarization),
                summarizer_api_key.clone(),
            )
            .with_shortcut(config.shortcuts.summarizer.clone()),
        ));
        registry.register(Arc::new(
            AudioRecorderAgent::new(Arc::clone(&services.audio))
                .with_shortcut(config.shortcuts.recorder.clone()),
        ));

        let preferences = Arc::new(preferences);
        let router = Arc::new(ShortcutRouter::new(
            router_config(config),
            Arc::clone(&registry),
            services.clipboard,
            services.hotkeys,
            feed.clone(),
            Arc::clone(&preferences),
        ));

        Self {
            history,
            registry,
            router,
            preferences,
            feed,
            translation: services.translation,
            summarization: services.summarization,
            audio: services.audio,
            summarizer_api_key,
        }
    }
}

fn router_config(config: &Config) -> RouterConfig {
    let mut surfaces = HashMap::new();
    if config.shortcuts.translation_surface {
        surfaces.insert(config.shortcuts.translator.clone(), SurfaceKind::Translation);
    }
    if config.shortcuts.summarizer_surface {
        surfaces.insert(config.shortcuts.summarizer.clone(), SurfaceKind::Summarizer);
    }
    RouterConfig {
        debounce: Duration::from_millis(config.shortcuts.debounce_ms),
        surfaces,
    }
}
