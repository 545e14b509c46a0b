//! Execution history store
//!
//! Append/update log of agent invocations with synchronous change listeners.
//! Listeners run after the store lock is released, in registration order; a
//! panicking listener is logged and skipped.

use crate::agents::ExecutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of an execution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Recorded, not started
    Pending,
    /// Agent is running
    Running,
    /// Agent returned a successful result
    Completed,
    /// Agent returned a failure or faulted
    Failed,
}

impl ExecutionStatus {
    fn rank(self) -> u8 {
        match self {
            ExecutionStatus::Pending => 0,
            ExecutionStatus::Running => 1,
            ExecutionStatus::Completed | ExecutionStatus::Failed => 2,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }

    /// Whether moving from `self` to `next` goes strictly forward
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// One agent invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Unique, stable identifier
    pub id: Uuid,
    /// Name of the agent that ran
    pub agent_name: String,
    /// Creation time; never changes
    pub timestamp: DateTime<Utc>,
    /// Input the agent received
    pub input: String,
    /// Current status
    pub status: ExecutionStatus,
    /// Output of a completed run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error of a failed run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the agent call in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AgentExecution {
    /// New pending record stamped with the current time
    pub fn pending(agent_name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_name: agent_name.into(),
            timestamp: Utc::now(),
            input: input.into(),
            status: ExecutionStatus::Pending,
            output: None,
            error: None,
            duration_ms: None,
        }
    }
}

/// Partial update applied to a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionUpdate {
    /// New status, if it changes
    pub status: Option<ExecutionStatus>,
    /// Output to set
    pub output: Option<String>,
    /// Error to set
    pub error: Option<String>,
    /// Duration to set
    pub duration_ms: Option<u64>,
}

impl ExecutionUpdate {
    /// Move to running
    pub fn running() -> Self {
        Self {
            status: Some(ExecutionStatus::Running),
            ..Default::default()
        }
    }

    /// Record the result returned by the agent
    pub fn finished(result: &ExecutionResult, duration_ms: u64) -> Self {
        Self {
            status: Some(if result.is_success() {
                ExecutionStatus::Completed
            } else {
                ExecutionStatus::Failed
            }),
            output: result.output().map(str::to_string),
            error: result.error().map(str::to_string),
            duration_ms: Some(duration_ms),
        }
    }

    /// Record a fault that escaped the agent
    pub fn faulted(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status: Some(ExecutionStatus::Failed),
            output: None,
            error: Some(message.into()),
            duration_ms: Some(duration_ms),
        }
    }
}

/// Errors raised by the history store
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HistoryError {
    /// No record with this id
    #[error("Execution not found: {0}")]
    NotFound(Uuid),

    /// The update would move the status backward or sideways
    #[error("Invalid status transition for {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Record id
        id: Uuid,
        /// Current status
        from: ExecutionStatus,
        /// Requested status
        to: ExecutionStatus,
    },
}

/// Derived history statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Number of records
    pub total: usize,
    /// Records in `completed`
    pub completed: usize,
    /// Records in `failed`
    pub failed: usize,
    /// round(100 × completed / total), 0 when empty
    pub success_rate: u32,
}

/// Handle returned by [`ExecutionHistory::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Change listener, called with the record after every create or mutation
pub type Listener = Arc<dyn Fn(&AgentExecution) + Send + Sync>;

/// In-memory execution log
///
/// Grows without bound until [`ExecutionHistory::clear`] is called.
#[derive(Default)]
pub struct ExecutionHistory {
    records: RwLock<Vec<AgentExecution>>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl ExecutionHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and notify listeners
    pub fn append(&self, execution: AgentExecution) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(execution.clone());
        self.notify(&execution);
    }

    /// Apply `update` to the record with `id` and notify listeners
    ///
    /// # Returns
    /// * The updated record
    pub fn update(&self, id: Uuid, update: ExecutionUpdate) -> Result<AgentExecution, HistoryError> {
        let updated = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            let record = records
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or(HistoryError::NotFound(id))?;

            if let Some(status) = update.status {
                if !record.status.can_transition_to(status) {
                    return Err(HistoryError::InvalidTransition {
                        id,
                        from: record.status,
                        to: status,
                    });
                }
                record.status = status;
            }
            if update.output.is_some() {
                record.output = update.output;
            }
            if update.error.is_some() {
                record.error = update.error;
            }
            if update.duration_ms.is_some() {
                record.duration_ms = update.duration_ms;
            }
            record.clone()
        };

        self.notify(&updated);
        Ok(updated)
    }

    /// All records, most recent first
    pub fn list(&self) -> Vec<AgentExecution> {
        let mut records: Vec<AgentExecution> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Record with `id`
    pub fn get(&self, id: Uuid) -> Option<AgentExecution> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Remove every record
    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derived statistics
    pub fn stats(&self) -> ExecutionStats {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let total = records.len();
        let completed = records
            .iter()
            .filter(|record| record.status == ExecutionStatus::Completed)
            .count();
        let failed = records
            .iter()
            .filter(|record| record.status == ExecutionStatus::Failed)
            .count();
        let success_rate = if total == 0 {
            0
        } else {
            (completed as f64 * 100.0 / total as f64).round() as u32
        };

        ExecutionStats {
            total,
            completed,
            failed,
            success_rate,
        }
    }

    /// Register a change listener
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AgentExecution) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener
    ///
    /// # Returns
    /// * `true` if the listener was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn notify(&self, execution: &AgentExecution) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(execution))).is_err() {
                tracing::error!(
                    execution_id = %execution.id,
                    agent_name = %execution.agent_name,
                    "Execution listener panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for ExecutionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionHistory")
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    fn record_at(agent: &str, offset_secs: i64) -> AgentExecution {
        let mut record = AgentExecution::pending(agent, "input");
        record.timestamp = Utc::now() + Duration::seconds(offset_secs);
        record
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let history = ExecutionHistory::new();
        history.append(record_at("old", -10));
        history.append(record_at("new", 10));
        history.append(record_at("middle", 0));

        let names: Vec<String> = history.list().into_iter().map(|r| r.agent_name).collect();
        assert_eq!(names, ["new", "middle", "old"]);
    }

    #[test]
    fn test_status_moves_forward_only() {
        let history = ExecutionHistory::new();
        let record = AgentExecution::pending("Translator", "Hello");
        let id = record.id;
        history.append(record);

        history.update(id, ExecutionUpdate::running()).unwrap();
        let done = history
            .update(id, ExecutionUpdate::finished(&ExecutionResult::success("Hallo"), 12))
            .unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert_eq!(done.output.as_deref(), Some("Hallo"));
        assert_eq!(done.duration_ms, Some(12));

        let err = history.update(id, ExecutionUpdate::running()).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidTransition { .. }));

        let err = history
            .update(id, ExecutionUpdate::faulted("late", 1))
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidTransition { .. }));
    }

    #[test]
    fn test_update_unknown_id() {
        let history = ExecutionHistory::new();
        let id = Uuid::new_v4();
        assert_eq!(
            history.update(id, ExecutionUpdate::running()).unwrap_err(),
            HistoryError::NotFound(id)
        );
    }

    #[test]
    fn test_stats_and_clear() {
        let history = ExecutionHistory::new();
        for success in [true, true, false] {
            let record = AgentExecution::pending("Agent", "x");
            let id = record.id;
            history.append(record);
            let result = if success {
                ExecutionResult::success("ok")
            } else {
                ExecutionResult::failure("no")
            };
            history
                .update(id, ExecutionUpdate::finished(&result, 0))
                .unwrap();
        }

        let stats = history.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 67);

        history.clear();
        assert!(history.list().is_empty());
        assert_eq!(history.stats(), ExecutionStats::default());
    }

    #[test]
    fn test_listeners_run_in_order_and_survive_panics() {
        let history = ExecutionHistory::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        history.add_listener(move |record| {
            first.lock().unwrap().push(format!("first:{:?}", record.status));
        });
        history.add_listener(|_| panic!("listener failure"));
        let third = Arc::clone(&seen);
        history.add_listener(move |record| {
            third.lock().unwrap().push(format!("third:{:?}", record.status));
        });

        let record = AgentExecution::pending("Agent", "x");
        let id = record.id;
        history.append(record);
        history.update(id, ExecutionUpdate::running()).unwrap();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [
                "first:Pending",
                "third:Pending",
                "first:Running",
                "third:Running"
            ]
        );
    }

    #[test]
    fn test_remove_listener() {
        let history = ExecutionHistory::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = history.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        history.append(AgentExecution::pending("Agent", "x"));
        assert!(history.remove_listener(id));
        assert!(!history.remove_listener(id));
        history.append(AgentExecution::pending("Agent", "y"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_read_history() {
        let history = Arc::new(ExecutionHistory::new());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::clone(&history);
        let sink = Arc::clone(&observed);
        history.add_listener(move |_| {
            sink.lock().unwrap().push(reader.len());
        });

        history.append(AgentExecution::pending("Agent", "x"));
        assert_eq!(observed.lock().unwrap().as_slice(), [1]);
    }
}
