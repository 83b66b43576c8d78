//! Candidate generation: one LLM call proposing the next directions.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::agent::prompts::candidates_prompt;
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate, LatsExtension};

static LIST_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+[.):]|[-*•])\s+(.+)$").expect("valid list item pattern")
});

/// Numbered or bulleted lines of `raw`, at most `n`. Unstructured text is one candidate.
pub fn parse_candidates(raw: &str, n: usize) -> Vec<String> {
    let items: Vec<String> = raw
        .lines()
        .filter_map(|line| LIST_ITEM_RE.captures(line))
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .take(n)
        .collect();
    if !items.is_empty() {
        return items;
    }
    let whole = raw.trim();
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole.to_string()]
    }
}

/// Starts a new depth: increments `depth`, resets the per-depth tool rounds and
/// stores the proposed candidates.
pub struct CandidatesNode {
    llm: Arc<dyn LlmClient>,
    num_candidates: usize,
}

impl CandidatesNode {
    pub fn new(llm: Arc<dyn LlmClient>, num_candidates: usize) -> Self {
        Self {
            llm,
            num_candidates,
        }
    }
}

#[async_trait]
impl Node<ConversationState> for CandidatesNode {
    fn id(&self) -> &str {
        "candidates"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let mut input = state.messages.clone();
        input.push(Message::system(candidates_prompt(self.num_candidates)));
        let response = self.llm.invoke(&input).await?;
        let candidates = parse_candidates(&response.content, self.num_candidates);

        let depth = state.lats.depth + 1;
        let note = format!("depth {}: {} candidate(s)", depth, candidates.len());
        Ok(ConversationUpdate::new()
            .lats(LatsExtension {
                depth,
                candidates,
                selected: None,
                tool_rounds: 0,
                action_history: state.lats.action_history.clone(),
            })
            .note(note))
    }
}
