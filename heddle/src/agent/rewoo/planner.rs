//! ReWOO planner node: one LLM call that produces the whole plan.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agent::prompts::{build_tool_guide, rewoo_planner_prompt};
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate, Plan};
use crate::tool_source::ToolSource;

/// Writes `state.plan`.
///
/// Unparseable or invalid plans (no JSON, unknown dependency, cycle) are replaced
/// by a single `fallback_tool` step seeded with the query, so the run always
/// has something to execute. Plans longer than `max_steps` are cut and the cut
/// is noted in the trace.
pub struct RewooPlannerNode {
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    max_steps: usize,
    fallback_tool: String,
}

impl RewooPlannerNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        max_steps: usize,
        fallback_tool: String,
    ) -> Self {
        Self {
            llm,
            tools,
            max_steps,
            fallback_tool,
        }
    }
}

#[async_trait]
impl Node<ConversationState> for RewooPlannerNode {
    fn id(&self) -> &str {
        "planner"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let guide = build_tool_guide(&self.tools.list_tools().await?);
        let mut input = vec![Message::system(rewoo_planner_prompt(&guide, self.max_steps))];
        input.extend(state.messages.iter().cloned());
        let response = self.llm.invoke(&input).await?;

        let (plan, note) = match Plan::parse(&response.content) {
            Ok(mut plan) => {
                let original = plan.len();
                if plan.truncate(self.max_steps) {
                    match plan.validate() {
                        Ok(()) => {
                            let note = format!(
                                "plan truncated from {} to {} steps: {}",
                                original,
                                plan.len(),
                                plan.summary()
                            );
                            (plan, note)
                        }
                        Err(e) => {
                            warn!(error = %e, "truncated plan is invalid, using fallback");
                            let plan = Plan::fallback(&self.fallback_tool, state.query());
                            (plan, format!("fallback plan ({})", e))
                        }
                    }
                } else {
                    let note = format!("planned {} step(s): {}", plan.len(), plan.summary());
                    (plan, note)
                }
            }
            Err(e) => {
                warn!(error = %e, "plan rejected, using fallback");
                let plan = Plan::fallback(&self.fallback_tool, state.query());
                (plan, format!("fallback plan ({})", e))
            }
        };
        debug!(steps = plan.len(), "rewoo plan ready");
        Ok(ConversationUpdate::new().plan(plan).note(note))
    }
}
