//! Mock LLM for tests and demos.
//!
//! Replies come from a script in order; once the script is exhausted the last
//! reply repeats. Every call is recorded so tests can assert on prompts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::tool_source::ToolSpec;

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    /// Whether tools were bound for this call.
    pub tools_bound: bool,
}

/// Scripted LLM.
///
/// **Interaction**: Implements `LlmClient`; used by every strategy in tests.
pub struct MockLlm {
    script: Vec<Result<LlmResponse, String>>,
    next: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    /// Replies with `responses` in order, repeating the last one.
    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: responses.into_iter().map(Ok).collect(),
            next: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `response`.
    pub fn always(response: LlmResponse) -> Self {
        Self::scripted(vec![response])
    }

    /// Always replies with plain text and no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::always(LlmResponse::text(content))
    }

    /// Every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: vec![Err(message.into())],
            next: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.recorded().len()
    }

    /// Snapshot of every call made so far.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn reply(&self, messages: &[Message], tools_bound: bool) -> Result<LlmResponse, AgentError> {
        let mut calls = self.calls.lock().unwrap_or_else(|p| p.into_inner());
        calls.push(RecordedCall {
            messages: messages.to_vec(),
            tools_bound,
        });
        drop(calls);

        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .script
            .get(idx)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Ok(LlmResponse::default()));
        entry.map_err(AgentError::Llm)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.reply(messages, false)
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        self.reply(messages, true)
    }
}
