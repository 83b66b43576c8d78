//! Synthesize node: one LLM call that turns step results into the final answer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate};

use super::prompts::synthesis_prompt;

/// Appends the final assistant answer built from `step_results` in plan order.
///
/// **Interaction**: End of the ReWOO and Plan-Execute graphs. When the plan was
/// truncated the prompt asks the model to mention what is missing.
pub struct SynthesizeNode {
    llm: Arc<dyn LlmClient>,
}

impl SynthesizeNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ConversationState> for SynthesizeNode {
    fn id(&self) -> &str {
        "synthesize"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let results = state.results_in_plan_order();
        let prompt = synthesis_prompt(state.plan.as_ref(), &results, state.plan_truncated);
        let mut input = state.messages.clone();
        input.push(Message::system(prompt));

        let response = self.llm.invoke(&input).await?;
        Ok(ConversationUpdate::new()
            .message(Message::assistant(response.content))
            .note(format!("synthesized answer from {} result(s)", results.len())))
    }
}
