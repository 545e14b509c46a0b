//! Shortcut router
//!
//! Turns OS hotkey activations into dispatcher calls or surface requests and
//! reports the outcome through the presentation sink.

use crate::agents::{ExecutionContext, ExecutionResult, SOURCE_KEY, TARGET_LANGUAGE_KEY, TOGGLE_INPUT};
use crate::collaborators::{
    Clipboard, HotkeyBinder, Notification, PresentationSink, ServiceError, SurfaceKind,
    SurfaceRequest,
};
use crate::dispatch::AgentRegistry;
use crate::routing::debounce::Debouncer;
use crate::state::PreferenceStore;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// Notification shown when an activation finds no clipboard text
pub const EMPTY_CLIPBOARD_MESSAGE: &str = "No text in clipboard";

/// Notification shown after a result was copied back
pub const COMPLETED_MESSAGE: &str = "Processing completed and copied to clipboard!";

/// Router settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Minimum time between two accepted activations of one shortcut
    pub debounce: Duration,
    /// Shortcuts that open a surface instead of dispatching
    pub surfaces: HashMap<String, SurfaceKind>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            surfaces: HashMap::from([("cmd+t".to_string(), SurfaceKind::Translation)]),
        }
    }
}

/// What an activation of a shortcut does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Run the bound agent through the dispatcher
    Dispatch,
    /// Hand the clipboard text to a surface
    OpenSurface(SurfaceKind),
}

/// Result of handling one activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// Dropped by the debouncer
    Debounced,
    /// The clipboard held no text
    EmptyClipboard,
    /// Reading the clipboard failed
    ClipboardError {
        /// Failure message
        message: String,
    },
    /// A surface request was delivered
    SurfaceOpened {
        /// Surface that was opened
        kind: SurfaceKind,
    },
    /// The surface could not be opened
    SurfaceFailed {
        /// Surface that failed
        kind: SurfaceKind,
    },
    /// The dispatcher ran
    Dispatched {
        /// Dispatcher result
        result: ExecutionResult,
    },
}

/// Shortcuts that were and were not registered with the OS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindReport {
    /// Successfully registered shortcuts
    pub bound: Vec<String>,
    /// Shortcut and failure message
    pub failed: Vec<(String, String)>,
}

/// Routes hotkey activations
pub struct ShortcutRouter {
    registry: Arc<AgentRegistry>,
    clipboard: Arc<dyn Clipboard>,
    hotkeys: Arc<dyn HotkeyBinder>,
    presentation: Arc<dyn PresentationSink>,
    preferences: Arc<PreferenceStore>,
    debouncer: Debouncer,
    surfaces: HashMap<String, SurfaceKind>,
    bound: Mutex<BTreeSet<String>>,
}

impl ShortcutRouter {
    /// Create a router
    pub fn new(
        config: RouterConfig,
        registry: Arc<AgentRegistry>,
        clipboard: Arc<dyn Clipboard>,
        hotkeys: Arc<dyn HotkeyBinder>,
        presentation: Arc<dyn PresentationSink>,
        preferences: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            registry,
            clipboard,
            hotkeys,
            presentation,
            preferences,
            debouncer: Debouncer::new(config.debounce),
            surfaces: config.surfaces,
            bound: Mutex::new(BTreeSet::new()),
        }
    }

    /// Register the shortcut of every enabled agent
    ///
    /// A failing shortcut is logged and reported; the rest are still bound.
    pub fn bind_enabled_shortcuts(&self) -> BindReport {
        let mut report = BindReport::default();

        for agent in self.registry.agents() {
            if !agent.is_enabled() {
                continue;
            }
            let shortcut = agent.shortcut().to_string();
            match self.hotkeys.register(&shortcut) {
                Ok(()) => {
                    info!(shortcut = %shortcut, agent_name = %agent.name(), "Registered global shortcut");
                    self.bound_set().insert(shortcut.clone());
                    report.bound.push(shortcut);
                }
                Err(e) => {
                    error!(shortcut = %shortcut, agent_name = %agent.name(), error = %e, "Failed to register shortcut");
                    report.failed.push((shortcut, e.to_string()));
                }
            }
        }
        report
    }

    /// Remove one shortcut registration
    pub fn unbind(&self, shortcut: &str) -> Result<(), ServiceError> {
        self.hotkeys.unregister(shortcut)?;
        self.bound_set().remove(shortcut);
        info!(shortcut = %shortcut, "Unregistered global shortcut");
        Ok(())
    }

    /// Remove every registration made by this router
    pub fn unbind_all(&self) {
        let shortcuts: Vec<String> = self.bound_set().iter().cloned().collect();
        for shortcut in shortcuts {
            if let Err(e) = self.unbind(&shortcut) {
                warn!(shortcut = %shortcut, error = %e, "Failed to unregister shortcut");
            }
        }
    }

    /// Currently registered shortcuts, sorted
    pub fn bound_shortcuts(&self) -> Vec<String> {
        self.bound_set().iter().cloned().collect()
    }

    /// Decide what an activation of `shortcut` does
    pub fn route(&self, shortcut: &str) -> RouteDecision {
        match self.surfaces.get(shortcut) {
            Some(kind) => RouteDecision::OpenSurface(*kind),
            None => RouteDecision::Dispatch,
        }
    }

    /// Handle one activation of `shortcut`
    pub async fn handle_activation(&self, shortcut: &str) -> ActivationOutcome {
        if !self.debouncer.accept(shortcut) {
            debug!(shortcut = %shortcut, "Activation debounced");
            return ActivationOutcome::Debounced;
        }

        info!(shortcut = %shortcut, "Shortcut activated");

        match self.route(shortcut) {
            RouteDecision::OpenSurface(kind) => self.open_surface(kind).await,
            RouteDecision::Dispatch => self.dispatch(shortcut).await,
        }
    }

    /// Handle activations until the sender side closes
    ///
    /// Each activation runs on its own task.
    pub async fn run(self: Arc<Self>, mut activations: UnboundedReceiver<String>) {
        while let Some(shortcut) = activations.recv().await {
            let router = Arc::clone(&self);
            tokio::spawn(async move {
                router.handle_activation(&shortcut).await;
            });
        }
        debug!("Hotkey activation channel closed");
    }

    async fn open_surface(&self, kind: SurfaceKind) -> ActivationOutcome {
        let text = match self.read_clipboard().await {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };

        let request = SurfaceRequest {
            kind,
            text,
            target_language: Some(self.preferences.selected_language()),
        };

        match self.presentation.open_surface(request).await {
            Ok(()) => ActivationOutcome::SurfaceOpened { kind },
            Err(e) => {
                error!(surface = ?kind, error = %e, "Failed to open surface");
                self.presentation
                    .notify(Notification::error(kind.open_failure_message()));
                ActivationOutcome::SurfaceFailed { kind }
            }
        }
    }

    async fn dispatch(&self, shortcut: &str) -> ActivationOutcome {
        let takes_clipboard = self
            .registry
            .resolve(shortcut)
            .map_or(true, |agent| agent.config().clipboard_input);

        let context = if takes_clipboard {
            let text = match self.read_clipboard().await {
                Ok(text) => text,
                Err(outcome) => return outcome,
            };
            ExecutionContext::new(text).with_metadata(SOURCE_KEY, "clipboard")
        } else {
            ExecutionContext::new(TOGGLE_INPUT).with_metadata(SOURCE_KEY, "hotkey")
        }
        .with_metadata(TARGET_LANGUAGE_KEY, self.preferences.selected_language());

        let result = self.registry.dispatch(shortcut, context).await;

        match (result.is_success(), result.output()) {
            (true, Some(output)) if !output.is_empty() => {
                if let Err(e) = self.clipboard.write_text(output).await {
                    warn!(shortcut = %shortcut, error = %e, "Failed to copy result to clipboard");
                }
                self.presentation
                    .notify(Notification::success(COMPLETED_MESSAGE));
            }
            (true, _) => {
                debug!(shortcut = %shortcut, "Agent returned empty output");
            }
            (false, _) => {
                self.presentation.notify(Notification::error(format!(
                    "Error: {}",
                    result.error().unwrap_or("unknown error")
                )));
            }
        }

        ActivationOutcome::Dispatched { result }
    }

    async fn read_clipboard(&self) -> Result<String, ActivationOutcome> {
        match self.clipboard.read_text().await {
            Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                info!("No text in clipboard");
                self.presentation
                    .notify(Notification::error(EMPTY_CLIPBOARD_MESSAGE));
                Err(ActivationOutcome::EmptyClipboard)
            }
            Err(e) => {
                error!(error = %e, "Failed to read clipboard");
                self.presentation
                    .notify(Notification::error(format!("Error: {}", e)));
                Err(ActivationOutcome::ClipboardError {
                    message: e.to_string(),
                })
            }
        }
    }

    fn bound_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.bound.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentConfig, AgentError};
    use crate::collaborators::NotificationLevel;
    use crate::dispatch::ExecutionHistory;
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Mutex<Option<String>>,
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

    #[derive(Default)]
    struct FakeHotkeys {
        reject: Vec<String>,
        registered: Mutex<Vec<String>>,
    }

    impl HotkeyBinder for FakeHotkeys {
        fn register(&self, shortcut: &str) -> Result<(), ServiceError> {
            if self.reject.iter().any(|s| s == shortcut) {
                return Err(ServiceError::Hotkey("already taken".to_string()));
            }
            self.registered.lock().unwrap().push(shortcut.to_string());
            Ok(())
        }

        fn unregister(&self, shortcut: &str) -> Result<(), ServiceError> {
            self.registered.lock().unwrap().retain(|s| s != shortcut);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
        surfaces: Mutex<Vec<SurfaceRequest>>,
        fail_surfaces: bool,
    }

    #[async_trait]
    impl PresentationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.notifications.lock().unwrap().push(notification);
        }

        async fn open_surface(&self, request: SurfaceRequest) -> Result<(), ServiceError> {
            if self.fail_surfaces {
                return Err(ServiceError::Unavailable("no window".to_string()));
            }
            self.surfaces.lock().unwrap().push(request);
            Ok(())
        }
    }

    struct ContextEcho {
        config: AgentConfig,
    }

    #[async_trait]
    impl Agent for ContextEcho {
        fn config(&self) -> &AgentConfig {
            &self.config
        }

        async fn execute(
            &self,
            context: &ExecutionContext,
        ) -> Result<ExecutionResult, AgentError> {
            Ok(ExecutionResult::success(format!(
                "{}|{}|{}",
                context.input,
                context.metadata_str(SOURCE_KEY).unwrap_or("-"),
                context.metadata_str(TARGET_LANGUAGE_KEY).unwrap_or("-")
            )))
        }
    }

    struct Fixture {
        router: ShortcutRouter,
        clipboard: Arc<MemoryClipboard>,
        hotkeys: Arc<FakeHotkeys>,
        sink: Arc<RecordingSink>,
        registry: Arc<AgentRegistry>,
        _dir: TempDir,
    }

    fn fixture(hotkeys: FakeHotkeys, sink: RecordingSink) -> Fixture {
        let dir = TempDir::new().unwrap();
        let preferences =
            Arc::new(PreferenceStore::load(dir.path().join("preferences.json"), "German").unwrap());
        let registry = Arc::new(AgentRegistry::new(Arc::new(ExecutionHistory::new())));
        registry.register(Arc::new(ContextEcho {
            config: AgentConfig::new("Echo", "", "cmd+e"),
        }));
        registry.register(Arc::new(ContextEcho {
            config: AgentConfig::new("Toggle", "", "cmd+r").without_clipboard_input(),
        }));
        registry.register(Arc::new(ContextEcho {
            config: AgentConfig::new("Off", "", "cmd+o").disabled(),
        }));

        let clipboard = Arc::new(MemoryClipboard::default());
        let hotkeys = Arc::new(hotkeys);
        let sink = Arc::new(sink);
        let router = ShortcutRouter::new(
            RouterConfig::default(),
            Arc::clone(&registry),
            clipboard.clone(),
            hotkeys.clone(),
            sink.clone(),
            preferences,
        );

        Fixture {
            router,
            clipboard,
            hotkeys,
            sink,
            registry,
            _dir: dir,
        }
    }

    #[test]
    fn test_bind_skips_disabled_and_reports_failures() {
        let f = fixture(
            FakeHotkeys {
                reject: vec!["cmd+r".to_string()],
                ..Default::default()
            },
            RecordingSink::default(),
        );

        let report = f.router.bind_enabled_shortcuts();

        assert_eq!(report.bound, ["cmd+e"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "cmd+r");
        assert_eq!(f.router.bound_shortcuts(), ["cmd+e"]);

        f.router.unbind_all();
        assert!(f.router.bound_shortcuts().is_empty());
        assert!(f.hotkeys.registered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_route_decision() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        assert_eq!(
            f.router.route("cmd+t"),
            RouteDecision::OpenSurface(SurfaceKind::Translation)
        );
        assert_eq!(f.router.route("cmd+e"), RouteDecision::Dispatch);
    }

    #[tokio::test]
    async fn test_dispatch_copies_result_back() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        f.clipboard.write_text("Hello").await.unwrap();

        let outcome = f.router.handle_activation("cmd+e").await;

        let ActivationOutcome::Dispatched { result } = outcome else {
            panic!("Expected dispatch, got: {:?}", outcome);
        };
        assert_eq!(result.output(), Some("Hello|clipboard|German"));
        assert_eq!(
            f.clipboard.read_text().await.unwrap().as_deref(),
            Some("Hello|clipboard|German")
        );
        let notifications = f.sink.notifications.lock().unwrap();
        assert_eq!(notifications[0], Notification::success(COMPLETED_MESSAGE));
    }

    #[tokio::test]
    async fn test_toggle_agent_ignores_clipboard() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());

        let outcome = f.router.handle_activation("cmd+r").await;

        let ActivationOutcome::Dispatched { result } = outcome else {
            panic!("Expected dispatch, got: {:?}", outcome);
        };
        assert_eq!(
            result.output(),
            Some(format!("{}|hotkey|German", TOGGLE_INPUT).as_str())
        );
    }

    #[tokio::test]
    async fn test_empty_clipboard_notifies_without_history() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        f.clipboard.write_text("   ").await.unwrap();

        let outcome = f.router.handle_activation("cmd+e").await;

        assert_eq!(outcome, ActivationOutcome::EmptyClipboard);
        assert!(f.registry.history().is_empty());
        assert_eq!(
            f.sink.notifications.lock().unwrap()[0],
            Notification::error(EMPTY_CLIPBOARD_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_debounce_drops_rapid_repeat() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        f.clipboard.write_text("Hello").await.unwrap();

        f.router.handle_activation("cmd+e").await;
        let second = f.router.handle_activation("cmd+e").await;

        assert_eq!(second, ActivationOutcome::Debounced);
        assert_eq!(f.registry.history().len(), 1);
        assert_eq!(f.sink.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_agent_reports_error() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        f.clipboard.write_text("Hello").await.unwrap();

        f.router.handle_activation("cmd+o").await;

        let notification = f.sink.notifications.lock().unwrap()[0].clone();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.message, "Error: Agent \"Off\" is disabled");
    }

    #[tokio::test]
    async fn test_translation_shortcut_opens_surface() {
        let f = fixture(FakeHotkeys::default(), RecordingSink::default());
        f.clipboard.write_text("Good morning").await.unwrap();

        let outcome = f.router.handle_activation("cmd+t").await;

        assert_eq!(
            outcome,
            ActivationOutcome::SurfaceOpened {
                kind: SurfaceKind::Translation
            }
        );
        let surfaces = f.sink.surfaces.lock().unwrap();
        assert_eq!(surfaces[0].text, "Good morning");
        assert_eq!(surfaces[0].target_language.as_deref(), Some("German"));
        assert!(f.registry.history().is_empty());
    }

    #[tokio::test]
    async fn test_surface_failure_notifies() {
        let f = fixture(
            FakeHotkeys::default(),
            RecordingSink {
                fail_surfaces: true,
                ..Default::default()
            },
        );
        f.clipboard.write_text("Good morning").await.unwrap();

        let outcome = f.router.handle_activation("cmd+t").await;

        assert_eq!(
            outcome,
            ActivationOutcome::SurfaceFailed {
                kind: SurfaceKind::Translation
            }
        );
        assert_eq!(
            f.sink.notifications.lock().unwrap()[0],
            Notification::error("Failed to open translation window")
        );
    }
}
