//! Scheduler node: dispatch every ready plan step as one batch of tool calls.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::agent::placeholder::resolve_args;
use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::state::{ConversationState, ConversationUpdate};

/// Emits one assistant message whose tool calls are the ready steps, with call
/// id = step id and `#E<k>` references resolved against recorded results.
///
/// A step is dispatched at most once per turn. When nothing can be dispatched
/// but the plan is incomplete, the plan is marked truncated and the graph moves
/// on to synthesis.
pub struct ExpandReadyNode;

#[async_trait]
impl Node<ConversationState> for ExpandReadyNode {
    fn id(&self) -> &str {
        "expand_ready"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let Some(plan) = &state.plan else {
            return Ok(ConversationUpdate::new().truncated().note("no plan to execute"));
        };

        let dispatched: HashSet<&str> = state
            .turn_messages()
            .iter()
            .flat_map(Message::tool_calls)
            .map(|c| c.id.as_str())
            .collect();
        let ready = plan.ready_steps(&state.completed_steps);
        let output_of = |id: u32| {
            state
                .step_results
                .iter()
                .find(|r| r.step_id == id)
                .map(|r| r.output.as_str())
        };

        let mut calls = Vec::new();
        let mut redispatch = false;
        for step in ready {
            let call_id = step.id.to_string();
            if dispatched.contains(call_id.as_str()) {
                redispatch = true;
                continue;
            }
            let upstream = step.depends_on.first().and_then(|d| output_of(*d));
            let args = resolve_args(&step.args, output_of, upstream);
            calls.push(ToolCall::new(call_id, step.tool.clone(), Value::Object(args)));
        }

        if calls.is_empty() {
            if plan.is_complete(&state.completed_steps) {
                return Ok(ConversationUpdate::new().note("plan complete"));
            }
            let pending: Vec<String> = plan
                .ids()
                .filter(|id| !state.completed_steps.contains(id))
                .map(|id| id.to_string())
                .collect();
            warn!(pending = %pending.join(","), "plan stalled, synthesizing partial results");
            return Ok(ConversationUpdate::new()
                .truncated()
                .note(format!("plan truncated: steps {} not executable", pending.join(", "))));
        }

        let ids: Vec<&str> = calls.iter().map(|c| c.id.as_str()).collect();
        debug!(batch = %ids.join(","), "dispatching ready steps");
        let note = format!("dispatching steps {}", ids.join(", "));
        let mut update = ConversationUpdate::new();
        if redispatch {
            update = update.truncated();
        }
        Ok(update
            .message(Message::assistant_with_calls("", calls))
            .note(note))
    }
}
