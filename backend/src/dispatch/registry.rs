//! Agent registry and dispatcher

use crate::agents::{Agent, ExecutionContext, ExecutionResult};
use crate::dispatch::history::{AgentExecution, ExecutionHistory, ExecutionUpdate};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shortcut-keyed agent registry
///
/// Dispatches run the agent and record the invocation in the shared
/// [`ExecutionHistory`].
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
    history: Arc<ExecutionHistory>,
}

impl AgentRegistry {
    /// Empty registry recording into `history`
    pub fn new(history: Arc<ExecutionHistory>) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            history,
        }
    }

    /// History this registry records into
    pub fn history(&self) -> &Arc<ExecutionHistory> {
        &self.history
    }

    /// Register `agent` under its shortcut, replacing any agent already there
    ///
    /// # Returns
    /// * The agent that was replaced, if any
    pub fn register(&self, agent: Arc<dyn Agent>) -> Option<Arc<dyn Agent>> {
        let shortcut = agent.shortcut().to_string();
        let name = agent.name().to_string();
        let replaced = self
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(shortcut.clone(), agent);

        match &replaced {
            Some(previous) => warn!(
                shortcut = %shortcut,
                agent_name = %name,
                replaced = %previous.name(),
                "Shortcut already registered, replacing agent"
            ),
            None => info!(shortcut = %shortcut, agent_name = %name, "Registered agent"),
        }
        replaced
    }

    /// Agent bound to `shortcut`
    pub fn resolve(&self, shortcut: &str) -> Option<Arc<dyn Agent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(shortcut)
            .cloned()
    }

    /// All registered agents, sorted by name
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        let mut agents: Vec<Arc<dyn Agent>> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        agents.sort_by(|a, b| a.name().cmp(b.name()));
        agents
    }

    /// Run the agent bound to `shortcut`
    ///
    /// Never fails: unknown or disabled shortcuts, agent failures and agent
    /// faults all come back as a failed [`ExecutionResult`]. Only actual runs
    /// are recorded in the history.
    pub async fn dispatch(&self, shortcut: &str, context: ExecutionContext) -> ExecutionResult {
        let Some(agent) = self.resolve(shortcut) else {
            warn!(shortcut = %shortcut, "No agent found for shortcut");
            return ExecutionResult::failure(format!("No agent found for shortcut: {}", shortcut));
        };

        let agent_name = agent.name().to_string();
        if !agent.is_enabled() {
            info!(shortcut = %shortcut, agent_name = %agent_name, "Agent is disabled");
            return ExecutionResult::failure(format!("Agent \"{}\" is disabled", agent_name));
        }

        let execution = AgentExecution::pending(agent_name.clone(), context.input.clone());
        let execution_id = execution.id;
        self.history.append(execution);
        self.apply(execution_id, ExecutionUpdate::running());

        info!(
            execution_id = %execution_id,
            agent_name = %agent_name,
            shortcut = %shortcut,
            "Executing agent"
        );

        let start = Instant::now();
        let outcome = AssertUnwindSafe(agent.execute(&context))
            .catch_unwind()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let fault = match outcome {
            Ok(Ok(result)) => {
                self.apply(execution_id, ExecutionUpdate::finished(&result, duration_ms));
                info!(
                    execution_id = %execution_id,
                    agent_name = %agent_name,
                    success = result.is_success(),
                    duration_ms,
                    "Agent finished"
                );
                return result;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        error!(
            execution_id = %execution_id,
            agent_name = %agent_name,
            error = %fault,
            duration_ms,
            "Agent execution faulted"
        );
        self.apply(execution_id, ExecutionUpdate::faulted(fault.clone(), duration_ms));
        ExecutionResult::failure(format!(
            "Agent \"{}\" execution failed: {}",
            agent_name, fault
        ))
    }

    fn apply(&self, id: Uuid, update: ExecutionUpdate) {
        if let Err(e) = self.history.update(id, update) {
            // Only reachable if the history was cleared mid-dispatch.
            warn!(execution_id = %id, error = %e, "Failed to update execution record");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "agent panicked".to_string()
    }
}
