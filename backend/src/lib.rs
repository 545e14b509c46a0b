//! Hotkey Agents Backend Library
//!
//! Agent registry, dispatcher and execution history, the shortcut router,
//! collaborator clients and the HTTP/WebSocket API of the daemon.
//! The daemon binary is in `src/main.rs`.

pub mod agents;
pub mod api;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod routing;
/// Application state management
///
/// Handles the shared daemon state and preference persistence.
pub mod state;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_support;
