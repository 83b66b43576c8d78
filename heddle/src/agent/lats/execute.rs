//! Execute: carry out the selected candidate with tools bound.
//!
//! Once a depth has used `max_tool_rounds` tool rounds the model is called
//! without tools, and any calls it still requests are dropped, so every
//! assistant tool call in the conversation has a tool reply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::prompts::{build_tool_guide, execute_prompt, TOOLS_EXHAUSTED_PROMPT};
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate};
use crate::tool_source::ToolSource;

const HISTORY_PREVIEW_CHARS: usize = 100;

/// Appends the model's reply; counts a tool round when the reply requests tools.
pub struct ExecuteNode {
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    max_tool_rounds: u32,
}

impl ExecuteNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<dyn ToolSource>, max_tool_rounds: u32) -> Self {
        Self {
            llm,
            tools,
            max_tool_rounds,
        }
    }
}

/// Latest tool output of the current turn, used when a tool-less reply is empty.
fn latest_tool_output(state: &ConversationState) -> Option<&str> {
    state.turn_messages().iter().rev().find_map(|m| match m {
        Message::Tool { content, .. } => Some(content.as_str()),
        _ => None,
    })
}

#[async_trait]
impl Node<ConversationState> for ExecuteNode {
    fn id(&self) -> &str {
        "execute"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let specs = self.tools.list_tools().await?;
        let candidate = state
            .lats
            .candidates
            .get(state.lats.selected.unwrap_or(0))
            .map(String::as_str);
        let tools_left = state.lats.tool_rounds < self.max_tool_rounds;
        let prompt = if tools_left {
            format!("{}\n\n{}", execute_prompt(candidate), build_tool_guide(&specs))
        } else {
            format!("{}\n\n{}", execute_prompt(candidate), TOOLS_EXHAUSTED_PROMPT)
        };
        let mut input = vec![Message::system(prompt)];
        input.extend(state.messages.iter().cloned());

        let mut response = if tools_left {
            self.llm.invoke_with_tools(&input, &specs).await?
        } else {
            let mut reply = self.llm.invoke(&input).await?;
            if !reply.tool_calls.is_empty() {
                debug!(
                    dropped = reply.tool_calls.len(),
                    "tool rounds spent, dropping requested calls"
                );
                reply.tool_calls.clear();
            }
            reply
        };
        if !tools_left && response.content.trim().is_empty() {
            if let Some(output) = latest_tool_output(state) {
                response.content = output.to_string();
            }
        }
        let mut ext = state.lats.clone();
        let action = if response.tool_calls.is_empty() {
            response.content.chars().take(HISTORY_PREVIEW_CHARS).collect()
        } else {
            ext.tool_rounds += 1;
            let names: Vec<&str> = response.tool_calls.iter().map(|c| c.name.as_str()).collect();
            format!("called {}", names.join(", "))
        };
        let note = format!("depth {}: {}", ext.depth, action);
        ext.action_history.push(action);
        Ok(ConversationUpdate::new()
            .message(response.into_message())
            .lats(ext)
            .note(note))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::{LlmResponse, MockLlm};
    use crate::message::ToolCall;
    use crate::tool_source::MockToolSource;

    /// **Scenario**: the selected candidate is in the prompt and tool requests count a round.
    #[tokio::test]
    async fn execute_follows_selected_candidate() {
        let llm = Arc::new(MockLlm::always(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("1", "search", json!({"query": "x"}))],
        )));
        let node = ExecuteNode::new(llm.clone(), Arc::new(MockToolSource::new()), 3);
        let mut state = ConversationState::new(vec![Message::user("q")]);
        state.lats.candidates = vec!["first".into(), "second idea".into()];
        state.lats.selected = Some(1);

        let update = node.run(&state).await.unwrap();
        let ext = update.lats.unwrap();
        assert_eq!(ext.tool_rounds, 1);
        assert_eq!(ext.action_history, vec!["called search".to_string()]);
        let prompt = llm.recorded()[0].messages[0].content().to_string();
        assert!(prompt.contains("second idea"));
        assert!(llm.recorded()[0].tools_bound);
    }

    /// **Scenario**: with the rounds spent the call is unbound, requested calls are dropped and
    /// an empty reply falls back to the latest tool output.
    #[tokio::test]
    async fn execute_without_rounds_left_answers_in_text() {
        let llm = Arc::new(MockLlm::always(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("2", "search", json!({"query": "y"}))],
        )));
        let node = ExecuteNode::new(llm.clone(), Arc::new(MockToolSource::new()), 1);
        let mut state = ConversationState::new(vec![
            Message::user("q"),
            Message::assistant_with_calls("", vec![ToolCall::new("1", "search", json!({}))]),
            Message::tool("1", "search", "Tokio is an async runtime."),
        ]);
        state.lats.tool_rounds = 1;

        let update = node.run(&state).await.unwrap();
        assert_eq!(
            update.messages,
            vec![Message::assistant("Tokio is an async runtime.")]
        );
        assert_eq!(update.lats.unwrap().tool_rounds, 1);
        let call = &llm.recorded()[0];
        assert!(!call.tools_bound);
        assert!(call.messages[0].content().contains("No more tool calls"));
    }
}
