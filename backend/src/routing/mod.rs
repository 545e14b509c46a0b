//! Shortcut routing: debounce, dispatch-or-surface decision, clipboard
//! round trip and user feedback.

pub mod debounce;
pub mod router;

pub use debounce::Debouncer;
pub use router::{
    ActivationOutcome, BindReport, RouteDecision, RouterConfig, ShortcutRouter,
    COMPLETED_MESSAGE, EMPTY_CLIPBOARD_MESSAGE,
};
