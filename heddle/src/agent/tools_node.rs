//! Tools node: executes every tool call on the last assistant message.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, RunContext};
use crate::state::{ConversationState, ConversationUpdate};
use crate::tool_source::ToolExecutor;

/// Appends one tool message per pending call, in the order the calls were issued.
///
/// **Interaction**: Shared by every strategy; the calls it runs come from the
/// agent (ReAct, LATS), the scheduler (ReWOO) or the executor (Plan-Execute).
pub struct ToolsNode {
    executor: ToolExecutor,
}

impl ToolsNode {
    pub fn new(executor: ToolExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Node<ConversationState> for ToolsNode {
    fn id(&self) -> &str {
        "tools"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        self.run_with_context(state, &RunContext::new(usize::MAX))
            .await
    }

    async fn run_with_context(
        &self,
        state: &ConversationState,
        ctx: &RunContext,
    ) -> Result<ConversationUpdate, AgentError> {
        let calls = state.pending_tool_calls();
        if calls.is_empty() {
            return Ok(ConversationUpdate::new().note("no pending tool calls"));
        }
        let results = self.executor.execute_batch(calls, ctx).await;
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        Ok(ConversationUpdate::new()
            .note(format!("executed {}", names.join(", ")))
            .messages(results))
    }
}
