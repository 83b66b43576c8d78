//! Conversation state threaded through every strategy graph.
//!
//! `ConversationState` is the value the engine passes node to node. Nodes never
//! mutate it directly; they return a sparse `ConversationUpdate` which
//! `GraphState::apply_update` merges (append messages, set plan, advance cursor, ...).

mod plan;

pub use plan::{extract_json_object, Plan, PlanError, Step};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::GraphState;
use crate::message::{Message, ToolCall};

/// Output of one executed plan step, recorded once per step id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: u32,
    pub tool: String,
    pub output: String,
}

/// Scratch state for the LATS search loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatsExtension {
    /// Completed candidate-generation cycles.
    pub depth: u32,
    /// Candidate directions proposed at the current depth.
    pub candidates: Vec<String>,
    /// Index into `candidates` chosen by reflection (or 0).
    pub selected: Option<usize>,
    /// Tool rounds executed at the current depth.
    pub tool_rounds: u32,
    /// Short record of each execute step.
    pub action_history: Vec<String>,
}

/// State for all strategy graphs.
///
/// Plan fields are used by ReWOO and Plan-Execute, `iterations` by ReAct,
/// `lats` by LATS. A fresh state is built per top-level query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub plan: Option<Plan>,
    /// Current step index (Plan-Execute). Only moves forward.
    pub cursor: usize,
    pub completed_steps: BTreeSet<u32>,
    pub step_results: Vec<StepResult>,
    /// Model turns taken (ReAct agent node).
    pub iterations: u32,
    pub replans: u32,
    /// Set when the scheduler gave up on the rest of the plan.
    pub plan_truncated: bool,
    pub lats: LatsExtension,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool calls on the last message when it is an assistant message.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.last_message().map(Message::tool_calls).unwrap_or(&[])
    }

    /// Messages after the last user message: what this turn has produced so far.
    pub fn turn_messages(&self) -> &[Message] {
        let start = self
            .messages
            .iter()
            .rposition(Message::is_user)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.messages[start..]
    }

    /// The user's question for this turn.
    pub fn query(&self) -> &str {
        crate::message::last_user_content(&self.messages).unwrap_or_default()
    }

    /// Content of the last assistant message, the answer shown to the user.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Step results sorted by the plan's step order; unknown ids go last.
    pub fn results_in_plan_order(&self) -> Vec<&StepResult> {
        let position = |id: u32| {
            self.plan
                .as_ref()
                .and_then(|p| p.steps.iter().position(|s| s.id == id))
                .unwrap_or(usize::MAX)
        };
        let mut results: Vec<&StepResult> = self.step_results.iter().collect();
        results.sort_by_key(|r| position(r.step_id));
        results
    }
}

/// Sparse overlay produced by a node. Unset fields leave the state untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationUpdate {
    pub messages: Vec<Message>,
    pub plan: Option<Plan>,
    pub cursor: Option<usize>,
    pub completed: Vec<StepResult>,
    pub iterations: Option<u32>,
    pub replans: Option<u32>,
    pub plan_truncated: Option<bool>,
    pub lats: Option<LatsExtension>,
    /// Short description recorded in the run trace.
    pub note: Option<String>,
}

impl ConversationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Marks a step completed with its result.
    pub fn complete(mut self, result: StepResult) -> Self {
        self.completed.push(result);
        self
    }

    pub fn iterations(mut self, n: u32) -> Self {
        self.iterations = Some(n);
        self
    }

    pub fn replans(mut self, n: u32) -> Self {
        self.replans = Some(n);
        self
    }

    pub fn truncated(mut self) -> Self {
        self.plan_truncated = Some(true);
        self
    }

    pub fn lats(mut self, ext: LatsExtension) -> Self {
        self.lats = Some(ext);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl GraphState for ConversationState {
    type Update = ConversationUpdate;

    fn apply_update(&mut self, update: ConversationUpdate) {
        self.messages.extend(update.messages);
        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
        if let Some(cursor) = update.cursor {
            debug_assert!(cursor >= self.cursor, "cursor moved backwards");
            self.cursor = cursor.max(self.cursor);
        }
        for result in update.completed {
            // A step id is recorded at most once.
            if self.completed_steps.insert(result.step_id) {
                self.step_results.push(result);
            }
        }
        if let Some(n) = update.iterations {
            self.iterations = n;
        }
        if let Some(n) = update.replans {
            self.replans = n;
        }
        if let Some(t) = update.plan_truncated {
            self.plan_truncated = t;
        }
        if let Some(ext) = update.lats {
            self.lats = ext;
        }
    }

    fn describe_update(update: &ConversationUpdate) -> String {
        if let Some(note) = &update.note {
            return note.clone();
        }
        let calls: Vec<&str> = update
            .messages
            .iter()
            .flat_map(|m| m.tool_calls())
            .map(|c| c.name.as_str())
            .collect();
        if !calls.is_empty() {
            return format!("requested tools: {}", calls.join(", "));
        }
        format!("+{} message(s)", update.messages.len())
    }
}
