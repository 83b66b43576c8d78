//! Agent execution error types.
//!
//! Returned by graph nodes when an LLM or tool collaborator fails. Tool failures
//! that the model should see are turned into tool messages instead (see
//! `tool_source::ToolExecutor`); only transport-level failures reach this type.

use thiserror::Error;

use crate::tool_source::ToolSourceError;

/// Node execution error. Propagates out of `run()` unchanged; no retry at this layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. malformed node input).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The LLM collaborator returned an error.
    #[error("llm call failed: {0}")]
    Llm(String),

    /// Listing tools failed while building a prompt.
    #[error("tool source error: {0}")]
    Tool(#[from] ToolSourceError),
}
