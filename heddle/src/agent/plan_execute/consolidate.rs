//! Consolidate node: record the step result and advance the cursor.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate, StepResult};

use super::executor::call_id_for;

/// Records the output of `plan.steps[cursor]` and moves the cursor by one.
pub struct ConsolidateNode;

#[async_trait]
impl Node<ConversationState> for ConsolidateNode {
    fn id(&self) -> &str {
        "consolidate"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let Some(step) = state.plan.as_ref().and_then(|p| p.steps.get(state.cursor)) else {
            return Ok(ConversationUpdate::new().note("nothing to consolidate"));
        };
        let call_id = call_id_for(step.id);
        let output = state.turn_messages().iter().rev().find_map(|m| match m {
            Message::Tool {
                call_id: id,
                content,
                ..
            } if *id == call_id => Some(content.clone()),
            _ => None,
        });

        let update = ConversationUpdate::new().cursor(state.cursor + 1);
        match output {
            Some(output) => {
                let note = format!("step {} done: {}", step.id, preview(&output));
                Ok(update
                    .complete(StepResult {
                        step_id: step.id,
                        tool: step.tool.clone(),
                        output,
                    })
                    .note(note))
            }
            None => Ok(update.note(format!("step {} produced no result", step.id))),
        }
    }
}

fn preview(s: &str) -> String {
    let line = s.lines().next().unwrap_or_default();
    if line.chars().count() > 60 {
        format!("{}...", line.chars().take(60).collect::<String>())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::GraphState;
    use crate::message::ToolCall;
    use crate::state::{Plan, Step};

    /// **Scenario**: the result of the step under the cursor is recorded and the cursor advances.
    #[tokio::test]
    async fn consolidate_records_and_advances() {
        let mut state = ConversationState::new(vec![
            Message::user("q"),
            Message::assistant_with_calls("", vec![ToolCall::new("pe-1", "search", json!({}))]),
            Message::tool("pe-1", "search", "found"),
        ]);
        state.plan = Some(Plan::new(vec![
            Step::new(1, "search", Default::default()),
            Step::new(2, "fetch", Default::default()),
        ]));

        let update = ConsolidateNode.run(&state).await.unwrap();
        state.apply_update(update);
        assert_eq!(state.cursor, 1);
        assert_eq!(state.step_results[0].output, "found");
        assert!(state.completed_steps.contains(&1));
    }
}
