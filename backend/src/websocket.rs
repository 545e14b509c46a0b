//! WebSocket handlers for real-time updates
//!
//! Clients receive an initial snapshot followed by every presentation feed
//! entry (notifications, surface requests, execution updates) as it is
//! published. Supports ping/pong for connection keepalive.

use crate::collaborators::FeedEntry;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// Client-to-server control messages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Ping message for connection keepalive
    Ping,
    /// Pong message responding to ping
    Pong,
}

/// Snapshot sent right after the upgrade
pub fn initial_state(state: &AppState) -> serde_json::Value {
    let agents: Vec<_> = state
        .registry
        .agents()
        .iter()
        .map(|agent| {
            serde_json::json!({
                "name": agent.name(),
                "shortcut": agent.shortcut(),
                "enabled": agent.is_enabled(),
            })
        })
        .collect();

    serde_json::json!({
        "type": "initial_state",
        "agents": agents,
        "stats": state.history.stats(),
        "language": state.preferences.selected_language(),
        "last_seq": state.feed.last_seq(),
    })
}

fn feed_message(entry: &FeedEntry) -> Option<Message> {
    match serde_json::to_string(entry) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            error!(seq = entry.seq, "Failed to serialize feed entry: {}", e);
            None
        }
    }
}

/// WebSocket upgrade handler
///
/// # Arguments
/// * `ws` - WebSocket upgrade request
/// * `state` - Application state
///
/// # Returns
/// * `Response` - HTTP response initiating WebSocket connection
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected");

    // Subscribe before the snapshot so nothing published in between is lost
    let mut feed = state.feed.subscribe();

    if let Err(e) = sender
        .send(Message::Text(initial_state(&state).to_string()))
        .await
    {
        error!("Failed to send initial state: {}", e);
        return;
    }

    // Use a channel to send messages from several tasks to the sender
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
    });

    let feed_tx = tx.clone();
    let mut feed_task = tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(entry) => {
                    if let Some(msg) = feed_message(&entry) {
                        if feed_tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging behind the presentation feed");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Task to send periodic pings
    let ping_tx = tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ControlMessage>(&text) {
                    Ok(ControlMessage::Ping) => {
                        if let Ok(pong) = serde_json::to_string(&ControlMessage::Pong) {
                            if tx.send(Message::Text(pong)).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(ControlMessage::Pong) => {}
                    Err(_) => warn!("Received unhandled WebSocket message: {}", text),
                },
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut feed_task => {}
        _ = &mut ping_task => {}
        _ = &mut recv_task => {}
    }
    send_task.abort();
    feed_task.abort();
    ping_task.abort();
    recv_task.abort();

    info!("WebSocket connection closed");
}
