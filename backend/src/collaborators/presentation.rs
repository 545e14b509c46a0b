//! Presentation feed
//!
//! The daemon has no window of its own. Notifications, surface requests and
//! execution updates are appended to a bounded, sequence-numbered feed that
//! the GUI polls (`GET /api/events?after=N`) and that WebSocket clients
//! receive live.

use crate::collaborators::{PresentationSink, ServiceError};
use crate::dispatch::AgentExecution;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Number of entries kept for pollers that fall behind
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// How long a poller counts as connected after its last poll
pub const CONSUMER_TIMEOUT: Duration = Duration::from_secs(10);

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Informational
    Info,
}

/// Transient on-screen message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text shown to the user
    pub message: String,
}

impl Notification {
    /// Success notification
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Error notification
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Informational notification
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Dedicated surface a shortcut can open instead of dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Streaming translation window
    Translation,
    /// Summary window
    Summarizer,
}

impl SurfaceKind {
    /// Message shown when the surface cannot be opened
    pub fn open_failure_message(self) -> &'static str {
        match self {
            SurfaceKind::Translation => "Failed to open translation window",
            SurfaceKind::Summarizer => "Failed to open summarizer window",
        }
    }
}

/// Request to open a surface with the clipboard text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    /// Which surface to open
    pub kind: SurfaceKind,
    /// Raw clipboard text
    pub text: String,
    /// Selected target language, for translation surfaces
    pub target_language: Option<String>,
}

/// Event published to presentation consumers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresentationEvent {
    /// Show a transient notification
    Notification(Notification),
    /// Open a dedicated surface
    Surface(SurfaceRequest),
    /// An execution record was created or changed
    Execution(AgentExecution),
}

/// Sequence-numbered feed entry
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    /// Monotonic sequence number, starting at 1
    pub seq: u64,
    /// Publication time
    pub timestamp: DateTime<Utc>,
    /// The event
    pub event: PresentationEvent,
}

#[derive(Debug, Default)]
struct FeedInner {
    last_seq: u64,
    entries: VecDeque<FeedEntry>,
}

/// Bounded event log plus live broadcast
///
/// Surfaces are only accepted while a consumer is attached: a live
/// subscriber, or a poller seen within [`CONSUMER_TIMEOUT`].
#[derive(Debug)]
pub struct PresentationFeed {
    inner: Mutex<FeedInner>,
    capacity: usize,
    sender: broadcast::Sender<FeedEntry>,
    last_poll: Mutex<Option<Instant>>,
}

impl PresentationFeed {
    /// Create a feed keeping at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Mutex::new(FeedInner::default()),
            capacity: capacity.max(1),
            sender,
            last_poll: Mutex::new(None),
        }
    }

    /// Append an event and broadcast it
    ///
    /// # Returns
    /// * The sequence number assigned to the event
    pub fn publish(&self, event: PresentationEvent) -> u64 {
        let entry = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.last_seq += 1;
            let entry = FeedEntry {
                seq: inner.last_seq,
                timestamp: Utc::now(),
                event,
            };
            inner.entries.push_back(entry.clone());
            while inner.entries.len() > self.capacity {
                inner.entries.pop_front();
            }
            entry
        };

        let seq = entry.seq;
        // No live subscribers is fine; pollers still see the entry.
        let _ = self.sender.send(entry);
        seq
    }

    /// Entries with a sequence number greater than `after`, oldest first
    ///
    /// Counts as a poll for [`PresentationFeed::has_consumer`].
    pub fn since(&self, after: u64) -> Vec<FeedEntry> {
        *self.last_poll.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .iter()
            .filter(|entry| entry.seq > after)
            .cloned()
            .collect()
    }

    /// Sequence number of the most recent entry (0 when nothing was published)
    pub fn last_seq(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_seq
    }

    /// Subscribe to live entries
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEntry> {
        self.sender.subscribe()
    }

    /// Whether anything is currently reading the feed
    pub fn has_consumer(&self) -> bool {
        self.has_consumer_at(Instant::now())
    }

    fn has_consumer_at(&self, now: Instant) -> bool {
        if self.sender.receiver_count() > 0 {
            return true;
        }
        self.last_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|polled| now.saturating_duration_since(polled) < CONSUMER_TIMEOUT)
    }
}

impl Default for PresentationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[async_trait]
impl PresentationSink for PresentationFeed {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            level = ?notification.level,
            message = %notification.message,
            "Notification"
        );
        self.publish(PresentationEvent::Notification(notification));
    }

    async fn open_surface(&self, request: SurfaceRequest) -> Result<(), ServiceError> {
        tracing::info!(
            kind = ?request.kind,
            text_len = request.text.len(),
            target_language = ?request.target_language,
            "Opening surface"
        );
        if !self.has_consumer() {
            tracing::warn!(kind = ?request.kind, "No presentation consumer attached");
            return Err(ServiceError::Unavailable(
                "No presentation consumer connected".to_string(),
            ));
        }
        self.publish(PresentationEvent::Surface(request));
        Ok(())
    }
}
