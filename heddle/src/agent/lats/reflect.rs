//! Reflection: the model evaluates the candidates and picks one.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::agent::prompts::reflection_prompt;
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate};

static SELECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SELECTED:\s*(\d+)").expect("valid selection pattern"));

/// Zero-based index from the last `SELECTED: n` line (1-based), clamped to the
/// candidate count. Defaults to the first candidate.
pub fn parse_selection(raw: &str, count: usize) -> usize {
    let picked = SELECTED_RE
        .captures_iter(raw)
        .last()
        .and_then(|c| c[1].parse::<usize>().ok())
        .unwrap_or(1);
    picked.clamp(1, count.max(1)) - 1
}

pub struct ReflectNode {
    llm: Arc<dyn LlmClient>,
}

impl ReflectNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ConversationState> for ReflectNode {
    fn id(&self) -> &str {
        "reflect"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let candidates = &state.lats.candidates;
        if candidates.is_empty() {
            return Ok(ConversationUpdate::new().note("no candidates to reflect on"));
        }
        let mut input = state.messages.clone();
        input.push(Message::system(reflection_prompt(candidates)));
        let response = self.llm.invoke(&input).await?;
        let selected = parse_selection(&response.content, candidates.len());

        let mut ext = state.lats.clone();
        ext.selected = Some(selected);
        let note = format!("selected candidate {}: {}", selected + 1, candidates[selected]);
        Ok(ConversationUpdate::new().lats(ext).note(note))
    }
}
