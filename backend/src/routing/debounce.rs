//! Per-key debounce

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Drops repeated activations of the same key within a time window
///
/// The window is measured from the last *accepted* activation, so a key held
/// down or mashed fires at most once per window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl Debouncer {
    /// Debouncer with the given window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Configured window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether an activation of `key` now should go through
    pub fn accept(&self, key: &str) -> bool {
        self.accept_at(key, Instant::now())
    }

    /// Whether an activation of `key` at `now` should go through
    pub fn accept_at(&self, key: &str, now: Instant) -> bool {
        let mut last_accepted = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = last_accepted.get(key) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        last_accepted.insert(key.to_string(), now);
        true
    }
}
