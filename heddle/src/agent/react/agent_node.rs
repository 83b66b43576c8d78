//! Agent node: call the LLM with tools bound and append its reply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::prompts::{build_tool_guide, REACT_SYSTEM_PROMPT};
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate};
use crate::tool_source::ToolSource;

pub struct AgentNode {
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    system_prompt: Option<String>,
    max_iterations: u32,
}

impl AgentNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        system_prompt: Option<String>,
        max_iterations: u32,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt,
            max_iterations,
        }
    }
}

#[async_trait]
impl Node<ConversationState> for AgentNode {
    fn id(&self) -> &str {
        "agent"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let specs = self.tools.list_tools().await?;
        let prompt = format!(
            "{}\n\n{}",
            self.system_prompt.as_deref().unwrap_or(REACT_SYSTEM_PROMPT),
            build_tool_guide(&specs)
        );
        let mut input = Vec::with_capacity(state.messages.len() + 1);
        input.push(Message::system(prompt));
        input.extend(state.messages.iter().cloned());

        let response = self.llm.invoke_with_tools(&input, &specs).await?;
        let iteration = state.iterations + 1;
        debug!(iteration, tool_calls = response.tool_calls.len(), "react agent turn");

        let note = if response.tool_calls.is_empty() {
            format!("iteration {}: answered", iteration)
        } else if iteration >= self.max_iterations {
            format!(
                "iteration {}: max iterations reached, {} tool call(s) dropped",
                iteration,
                response.tool_calls.len()
            )
        } else {
            let names: Vec<&str> = response.tool_calls.iter().map(|c| c.name.as_str()).collect();
            format!("iteration {}: calls {}", iteration, names.join(", "))
        };
        Ok(ConversationUpdate::new()
            .message(response.into_message())
            .iterations(iteration)
            .note(note))
    }
}
