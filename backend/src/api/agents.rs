//! Agent API handlers
//!
//! Listing registered agents, dispatching through the registry and simulating
//! hotkey activations.

use crate::agents::{ExecutionContext, ExecutionResult, SOURCE_KEY};
use crate::error::AppError;
use crate::routing::ActivationOutcome;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Agent response type
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    /// Display name
    pub name: String,
    /// What the agent does
    pub description: String,
    /// Routing key
    pub shortcut: String,
    /// Whether the agent may run
    pub enabled: bool,
    /// Whether the agent is fed clipboard text
    pub clipboard_input: bool,
    /// Whether the shortcut is registered with the OS
    pub bound: bool,
}

/// Agents list response
#[derive(Debug, Serialize)]
pub struct AgentsListResponse {
    /// All agents, sorted by name
    pub agents: Vec<AgentResponse>,
    /// Total number of agents
    pub count: usize,
}

/// Dispatch request
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    /// Shortcut of the agent to run
    pub shortcut: String,
    /// Input text
    #[serde(default)]
    pub input: String,
    /// Extra metadata
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// GET /api/agents - List all agents
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AgentsListResponse>, AppError> {
    let bound = state.router.bound_shortcuts();
    let agents: Vec<AgentResponse> = state
        .registry
        .agents()
        .iter()
        .map(|agent| {
            let config = agent.config();
            AgentResponse {
                name: config.name.clone(),
                description: config.description.clone(),
                shortcut: config.shortcut.clone(),
                enabled: config.enabled,
                clipboard_input: config.clipboard_input,
                bound: bound.contains(&config.shortcut),
            }
        })
        .collect();

    Ok(Json(AgentsListResponse {
        count: agents.len(),
        agents,
    }))
}

/// POST /api/agents/dispatch - Run an agent with explicit input
///
/// Failures are reported in the result body, not as HTTP errors.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<ExecutionResult>, AppError> {
    if request.shortcut.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "shortcut cannot be empty".to_string(),
        ));
    }

    let mut context = ExecutionContext::new(request.input);
    context.metadata = request.metadata;
    context
        .metadata
        .entry(SOURCE_KEY.to_string())
        .or_insert_with(|| Value::from("api"));

    let result = state.registry.dispatch(&request.shortcut, context).await;
    Ok(Json(result))
}

/// POST /api/shortcuts/:shortcut/activate - Simulate a hotkey press
pub async fn activate_shortcut(
    State(state): State<Arc<AppState>>,
    Path(shortcut): Path<String>,
) -> Result<Json<ActivationOutcome>, AppError> {
    let outcome = state.router.handle_activation(&shortcut).await;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_list_agents() {
        let fixture = test_state();
        let response = list_agents(State(fixture.state.clone())).await.unwrap();

        assert_eq!(response.count, 3);
        assert_eq!(response.agents[0].name, "Audio Recorder");
        assert!(!response.agents[0].clipboard_input);
        assert!(!response.agents[0].bound);
    }

    #[tokio::test]
    async fn test_dispatch_translator_with_language() {
        let fixture = test_state();
        let request = DispatchRequest {
            shortcut: "cmd+t".to_string(),
            input: "Hello".to_string(),
            metadata: HashMap::from([("targetLanguage".to_string(), Value::from("French"))]),
        };

        let result = dispatch(State(fixture.state.clone()), Json(request))
            .await
            .unwrap();

        assert_eq!(result.output(), Some("[French] Hello"));
        assert_eq!(fixture.state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_shortcut_is_failure_body() {
        let fixture = test_state();
        let request = DispatchRequest {
            shortcut: "cmd+9".to_string(),
            input: "Hello".to_string(),
            metadata: HashMap::new(),
        };

        let result = dispatch(State(fixture.state.clone()), Json(request))
            .await
            .unwrap();

        assert_eq!(result.error(), Some("No agent found for shortcut: cmd+9"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_blank_shortcut() {
        let fixture = test_state();
        let request = DispatchRequest {
            shortcut: " ".to_string(),
            input: String::new(),
            metadata: HashMap::new(),
        };

        let result = dispatch(State(fixture.state.clone()), Json(request)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_activate_summarizer_copies_back() {
        let fixture = test_state();
        *fixture.clipboard.text.lock().unwrap() = Some("abcdef".to_string());

        let outcome = activate_shortcut(State(fixture.state.clone()), Path("cmd+s".to_string()))
            .await
            .unwrap();

        assert!(matches!(outcome.0, ActivationOutcome::Dispatched { .. }));
        assert_eq!(
            fixture.clipboard.text.lock().unwrap().as_deref(),
            Some("summary of 6 chars")
        );
    }
}
