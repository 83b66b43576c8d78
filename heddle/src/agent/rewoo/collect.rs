//! Collect node: record the results of the batch that just ran.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate, StepResult};

/// Marks plan steps completed from this turn's tool messages (call id = step id).
///
/// Idempotent: steps already completed, and tool messages that do not name a
/// plan step, are ignored.
pub struct CollectNode;

#[async_trait]
impl Node<ConversationState> for CollectNode {
    fn id(&self) -> &str {
        "collect"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let Some(plan) = &state.plan else {
            return Ok(ConversationUpdate::new().note("no plan"));
        };
        let mut update = ConversationUpdate::new();
        let mut recorded = Vec::new();
        for msg in state.turn_messages() {
            let Message::Tool {
                call_id,
                name,
                content,
            } = msg
            else {
                continue;
            };
            let Ok(step_id) = call_id.parse::<u32>() else {
                continue;
            };
            if plan.step(step_id).is_none()
                || state.completed_steps.contains(&step_id)
                || recorded.contains(&step_id)
            {
                continue;
            }
            recorded.push(step_id);
            update = update.complete(StepResult {
                step_id,
                tool: name.clone(),
                output: content.clone(),
            });
        }
        let ids: Vec<String> = recorded.iter().map(u32::to_string).collect();
        let note = if ids.is_empty() {
            "no new results".to_string()
        } else {
            format!("completed steps {}", ids.join(", "))
        };
        Ok(update.note(note))
    }
}
