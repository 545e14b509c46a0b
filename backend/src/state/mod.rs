// State management module
// Holds the daemon's shared state and preference persistence

pub mod app_state;
pub mod preferences;

pub use app_state::{AppState, Services};
pub use preferences::{PersistenceError, PreferenceStore};
