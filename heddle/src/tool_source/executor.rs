//! Executes tool calls against a `ToolSource` and produces tool messages.
//!
//! A failed call is not an error at this layer: it becomes a tool message whose
//! content starts with `Error:` so the next model call can react to it. Calls in
//! one batch run concurrently; results are returned in the order the calls were issued.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, trace, warn};

use crate::graph::RunContext;
use crate::message::{Message, ToolCall};
use crate::stream::StreamEvent;

use super::ToolSource;

/// Template for failed calls; `{error}` is replaced with the error text.
pub const DEFAULT_TOOL_ERROR_TEMPLATE: &str = "Error: {error}\n Please fix your mistakes.";

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Executes `ToolCall`s; cheap to clone.
#[derive(Clone)]
pub struct ToolExecutor {
    tools: Arc<dyn ToolSource>,
    error_template: String,
}

impl ToolExecutor {
    pub fn new(tools: Arc<dyn ToolSource>) -> Self {
        Self {
            tools,
            error_template: DEFAULT_TOOL_ERROR_TEMPLATE.to_string(),
        }
    }

    pub fn with_error_template(mut self, template: impl Into<String>) -> Self {
        self.error_template = template.into();
        self
    }

    pub fn source(&self) -> &Arc<dyn ToolSource> {
        &self.tools
    }

    /// Runs one call and returns the tool message answering it.
    pub async fn execute(&self, call: &ToolCall) -> Message {
        trace!(tool = %call.name, call_id = %call.id, args = %call.arguments, "calling tool");
        let content = match self.tools.call_tool(&call.name, call.arguments.clone()).await {
            Ok(result) => {
                debug!(
                    tool = %call.name,
                    call_id = %call.id,
                    result = %truncate_for_log(&result.text, 200),
                    "tool call ok"
                );
                result.text
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                self.error_template.replace("{error}", &e.to_string())
            }
        };
        Message::tool(call.id.clone(), call.name.clone(), content)
    }

    /// Runs a batch concurrently; output order matches `calls`.
    pub async fn execute_batch(&self, calls: &[ToolCall], ctx: &RunContext) -> Vec<Message> {
        for call in calls {
            ctx.emit(StreamEvent::ToolCall { call: call.clone() }).await;
        }
        let results = join_all(calls.iter().map(|c| self.execute(c))).await;
        for msg in &results {
            if let Message::Tool {
                call_id,
                name,
                content,
            } = msg
            {
                ctx.emit(StreamEvent::ToolResult {
                    call_id: call_id.clone(),
                    name: name.clone(),
                    content: content.clone(),
                })
                .await;
            }
        }
        results
    }
}
