//! Agent dispatch and execution tracking

pub mod history;
pub mod registry;

pub use history::{
    AgentExecution, ExecutionHistory, ExecutionStats, ExecutionStatus, ExecutionUpdate,
    HistoryError, ListenerId,
};
pub use registry::AgentRegistry;
