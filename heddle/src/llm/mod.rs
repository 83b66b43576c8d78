//! LLM client abstraction: ordered messages in, one assistant reply out.
//!
//! Strategies depend on `LlmClient` only; the concrete provider is an external
//! collaborator. `MockLlm` scripts replies for tests and demos.

mod mock;

pub use mock::{MockLlm, RecordedCall};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Assistant reply from one LLM call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Empty when the model answers directly.
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn into_message(self) -> Message {
        Message::assistant_with_calls(self.content, self.tool_calls)
    }
}

/// LLM client: given messages, returns assistant text and optional tool calls.
///
/// No retry or backoff here; an error fails the whole run.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One call without tool binding (planning, reflection, synthesis).
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// One call with `tools` bound so the model may request tool calls.
    ///
    /// Default implementation ignores `tools` and calls `invoke`.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        let _ = tools;
        self.invoke(messages).await
    }
}
