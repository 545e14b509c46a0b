//! Presentation feed polling

use crate::collaborators::FeedEntry;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Poll parameters
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Return entries with a sequence number greater than this
    #[serde(default)]
    pub after: u64,
}

/// Poll response
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Entries, oldest first
    pub events: Vec<FeedEntry>,
    /// Sequence number to pass as `after` next time
    pub last_seq: u64,
}

/// GET /api/events?after=N
pub async fn poll_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, AppError> {
    let events = state.feed.since(query.after);
    let last_seq = events
        .last()
        .map(|entry| entry.seq)
        .unwrap_or_else(|| state.feed.last_seq().max(query.after));
    Ok(Json(EventsResponse { events, last_seq }))
}
