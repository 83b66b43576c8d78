//! Plan-Execute planner: initial plan, or a replan that appends after executed steps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::agent::prompts::{build_tool_guide, replan_prompt, sequential_planner_prompt};
use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ConversationState, ConversationUpdate, Plan, Step};
use crate::tool_source::ToolSource;

/// Writes `state.plan`.
///
/// First run: the model's steps sorted by id, cut to `max_steps`, or the
/// single-step fallback when the output is unusable. Replan (a plan is already
/// set): increments `replans`, keeps steps `0..cursor`, renumbers the new steps
/// after the last executed id and appends them. An unusable replan adds no steps,
/// which sends the run to synthesis.
pub struct PlanExecutePlannerNode {
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    max_steps: usize,
    fallback_tool: String,
}

impl PlanExecutePlannerNode {
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

    fn initial_plan(&self, raw: &str, query: &str) -> (Plan, String) {
        match Plan::parse(raw) {
            Ok(mut plan) => {
                plan.steps.sort_by_key(|s| s.id);
                let cut = plan.truncate(self.max_steps);
                if let Err(e) = plan.validate() {
                    warn!(error = %e, "truncated plan is invalid, using fallback");
                    return (
                        Plan::fallback(&self.fallback_tool, query),
                        format!("fallback plan ({})", e),
                    );
                }
                let note = if cut {
                    format!("plan truncated to {} steps: {}", plan.len(), plan.summary())
                } else {
                    format!("planned {} step(s): {}", plan.len(), plan.summary())
                };
                (plan, note)
            }
            Err(e) => {
                warn!(error = %e, "plan rejected, using fallback");
                (
                    Plan::fallback(&self.fallback_tool, query),
                    format!("fallback plan ({})", e),
                )
            }
        }
    }
}

/// Keeps `executed` and appends `new_steps` renumbered after the last executed id.
fn merge_replan(executed: &[Step], new_steps: Vec<Step>) -> Plan {
    let base = executed.iter().map(|s| s.id).max().unwrap_or(0);
    let renumber: HashMap<u32, u32> = new_steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, base + 1 + i as u32))
        .collect();
    let appended = new_steps.into_iter().enumerate().map(|(i, mut s)| {
        s.id = base + 1 + i as u32;
        s.depends_on = s
            .depends_on
            .iter()
            .filter_map(|d| renumber.get(d).copied())
            .collect();
        s
    });
    Plan::new(executed.iter().cloned().chain(appended).collect())
}

#[async_trait]
impl Node<ConversationState> for PlanExecutePlannerNode {
    fn id(&self) -> &str {
        "planner"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let guide = build_tool_guide(&self.tools.list_tools().await?);

        let Some(current) = &state.plan else {
            let mut input = vec![Message::system(sequential_planner_prompt(
                &guide,
                self.max_steps,
            ))];
            input.extend(state.messages.iter().cloned());
            let response = self.llm.invoke(&input).await?;
            let (plan, note) = self.initial_plan(&response.content, state.query());
            return Ok(ConversationUpdate::new().plan(plan).note(note));
        };

        let replans = state.replans + 1;
        let results = state.results_in_plan_order();
        let mut input = vec![Message::system(replan_prompt(&guide, &results, self.max_steps))];
        input.extend(state.messages.iter().cloned());
        let response = self.llm.invoke(&input).await?;

        let executed = &current.steps[..state.cursor.min(current.len())];
        let mut new_steps = match Plan::parse(&response.content) {
            Ok(plan) => plan.steps,
            Err(e) => {
                warn!(error = %e, "replan unusable, no new steps");
                Vec::new()
            }
        };
        new_steps.sort_by_key(|s| s.id);
        new_steps.truncate(self.max_steps);
        let added = new_steps.len();
        let plan = merge_replan(executed, new_steps);
        info!(replans, added, "replanned");

        Ok(ConversationUpdate::new()
            .plan(plan)
            .replans(replans)
            .note(format!("replan {}: {} new step(s)", replans, added)))
    }
}
