//! Tool source abstraction: list tools and call a tool.
//!
//! Strategies depend on `ToolSource` instead of concrete tools. `ToolExecutor`
//! turns a `ToolCall` into a `Message::Tool`, folding failures into error text the
//! model can read. `MockToolSource` serves canned results for tests.

mod executor;
mod mock;

pub use executor::{ToolExecutor, DEFAULT_TOOL_ERROR_TEMPLATE};
pub use mock::MockToolSource;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification, aligned with MCP `tools/list` items.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: serde_json::json!({"type": "object"}),
        }
    }
}

/// Result of a single successful tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Errors from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("tool failed: {0}")]
    Failed(String),
}

/// Tool source: list tools and call a tool.
///
/// **Interaction**: `list_tools` feeds the tool guide in prompts and the tool
/// binding of LLM calls; `call_tool` is used by `ToolExecutor`.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolCallContent, ToolSourceError>;
}
