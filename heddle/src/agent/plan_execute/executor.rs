//! Executor node: dispatch the step under the cursor.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::placeholder::resolve_args;
use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::state::{ConversationState, ConversationUpdate};

/// Tool call id used for plan step `id`.
pub fn call_id_for(step_id: u32) -> String {
    format!("pe-{}", step_id)
}

/// Emits one tool call for `plan.steps[cursor]`, with references to earlier
/// outputs resolved.
///
/// The upstream for a relative `url` argument is the latest tool message of
/// this turn produced by an expected upstream tool: the tools of the step's
/// dependencies, or `url_source_tools` when it declares none.
pub struct ExecutorNode {
    url_source_tools: Vec<String>,
}

impl ExecutorNode {
    pub fn new(url_source_tools: Vec<String>) -> Self {
        Self { url_source_tools }
    }
}

/// Content of the latest tool message in `state`'s turn whose tool is in `tools`.
fn latest_output_of<'a>(state: &'a ConversationState, tools: &[&str]) -> Option<&'a str> {
    state.turn_messages().iter().rev().find_map(|m| match m {
        Message::Tool { name, content, .. } if tools.contains(&name.as_str()) => {
            Some(content.as_str())
        }
        _ => None,
    })
}

#[async_trait]
impl Node<ConversationState> for ExecutorNode {
    fn id(&self) -> &str {
        "executor"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let step = state
            .plan
            .as_ref()
            .and_then(|p| p.steps.get(state.cursor))
            .ok_or_else(|| {
                AgentError::ExecutionFailed(format!("no plan step at cursor {}", state.cursor))
            })?;

        let output_of = |id: u32| {
            state
                .step_results
                .iter()
                .find(|r| r.step_id == id)
                .map(|r| r.output.as_str())
        };
        let dependency_tools: Vec<&str> = step
            .depends_on
            .iter()
            .filter_map(|id| state.plan.as_ref().and_then(|p| p.step(*id)))
            .map(|dep| dep.tool.as_str())
            .collect();
        let expected: Vec<&str> = if dependency_tools.is_empty() {
            self.url_source_tools.iter().map(String::as_str).collect()
        } else {
            dependency_tools
        };
        let upstream = latest_output_of(state, &expected);
        let args = resolve_args(&step.args, output_of, upstream);

        let call = ToolCall::new(call_id_for(step.id), step.tool.clone(), Value::Object(args));
        let note = format!("step {} ({}): {}", step.id, step.tool, step.description);
        Ok(ConversationUpdate::new()
            .message(Message::assistant_with_calls("", vec![call]))
            .note(note))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{Plan, Step, StepResult};

    fn executor() -> ExecutorNode {
        ExecutorNode::new(vec!["search".into(), "web_search".into()])
    }

    fn fetch_args() -> serde_json::Map<String, Value> {
        let mut args = serde_json::Map::new();
        args.insert("url".into(), json!("the first result"));
        args
    }

    /// **Scenario**: a relative url argument takes the first URL of the latest search output,
    /// even when another step ran in between.
    #[tokio::test]
    async fn executor_resolves_url_from_latest_search() {
        let mut state = ConversationState::new(vec![
            Message::user("q"),
            Message::tool("pe-1", "search", "1. Docs\nURL: https://docs.rs/tokio"),
            Message::tool("pe-2", "note", "see https://unrelated.example"),
        ]);
        state.plan = Some(Plan::new(vec![
            Step::new(1, "search", Default::default()),
            Step::new(2, "note", Default::default()),
            Step::new(3, "web_fetch", fetch_args()),
        ]));
        state.cursor = 2;

        let update = executor().run(&state).await.unwrap();
        let call = &update.messages[0].tool_calls()[0];
        assert_eq!(call.id, "pe-3");
        assert_eq!(call.arguments, json!({"url": "https://docs.rs/tokio"}));
    }

    /// **Scenario**: declared dependencies name the upstream tool; search output of an
    /// earlier turn is ignored.
    #[tokio::test]
    async fn executor_prefers_dependency_tool_within_turn() {
        let mut state = ConversationState::new(vec![
            Message::user("old"),
            Message::tool("pe-1", "search", "URL: https://old.example"),
            Message::user("q"),
            Message::tool("pe-1", "lookup", "URL: https://lookup.example"),
            Message::tool("pe-2", "search", "URL: https://search.example"),
        ]);
        state.plan = Some(Plan::new(vec![
            Step::new(1, "lookup", Default::default()),
            Step::new(2, "search", Default::default()),
            Step::new(3, "web_fetch", fetch_args()).depends_on([1]),
        ]));
        state.cursor = 2;

        let update = executor().run(&state).await.unwrap();
        let call = &update.messages[0].tool_calls()[0];
        assert_eq!(call.arguments, json!({"url": "https://lookup.example"}));
    }

    /// **Scenario**: `#E<k>` references use the recorded step results.
    #[tokio::test]
    async fn executor_resolves_step_references() {
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!("summarize #E1"));
        let mut state = ConversationState::new(vec![Message::user("q")]);
        state.plan = Some(Plan::new(vec![
            Step::new(1, "search", Default::default()),
            Step::new(2, "summarize", args),
        ]));
        state.cursor = 1;
        state.step_results.push(StepResult {
            step_id: 1,
            tool: "search".into(),
            output: "found".into(),
        });

        let update = executor().run(&state).await.unwrap();
        let call = &update.messages[0].tool_calls()[0];
        assert_eq!(call.arguments, json!({"text": "summarize found"}));
    }

    /// **Scenario**: a cursor past the plan is an execution error, not a panic.
    #[tokio::test]
    async fn executor_without_step_fails() {
        let state = ConversationState::new(vec![Message::user("q")]);
        assert!(matches!(
            executor().run(&state).await,
            Err(AgentError::ExecutionFailed(_))
        ));
    }
}
