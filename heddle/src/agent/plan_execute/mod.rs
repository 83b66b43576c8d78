//! Plan-Execute: a sequential plan run one step at a time, with bounded replanning.
//!
//! ```text
//! START → planner ─┬─ executor → tools → consolidate ─┬─ executor
//!                  └─ synthesize → END                ├─ planner (replan)
//!                                                     └─ synthesize
//! ```
//!
//! `cursor` indexes the next step and only moves forward. When a step's output
//! starts with a replan trigger (default `Error`) and replans remain, the planner
//! runs again with the results so far; executed steps are kept and the new steps
//! are appended after them.

mod consolidate;
mod executor;
mod planner;

pub use consolidate::ConsolidateNode;
pub use executor::{call_id_for, ExecutorNode};
pub use planner::PlanExecutePlannerNode;

use std::sync::Arc;

use serde_json::{json, Value};

use crate::graph::{path_map, CompiledStateGraph, GraphError, StateGraph, END, START};
use crate::settings::PlanExecuteConfig;
use crate::state::ConversationState;
use crate::strategy::{GraphStrategy, StrategyGraph};

use super::{StrategyDeps, SynthesizeNode, ToolsNode};

/// True when `output` starts with one of `triggers`, ignoring case and leading space.
pub fn is_replan_trigger(output: &str, triggers: &[String]) -> bool {
    let head = output.trim_start().to_lowercase();
    triggers
        .iter()
        .filter(|t| !t.is_empty())
        .any(|t| head.starts_with(&t.to_lowercase()))
}

/// Route after `planner`.
fn after_plan(state: &ConversationState) -> &'static str {
    match &state.plan {
        Some(plan) if state.cursor < plan.len() => "execute",
        _ => "synthesize",
    }
}

/// Route after `consolidate`: replan on a failed step while replans remain.
fn after_step(state: &ConversationState, config: &PlanExecuteConfig) -> &'static str {
    let failed = state
        .step_results
        .last()
        .is_some_and(|r| is_replan_trigger(&r.output, &config.replan_triggers));
    if failed && state.replans < config.max_replans {
        return "replan";
    }
    after_plan(state)
}

/// Graph blueprint for Plan-Execute.
pub struct PlanExecuteGraph;

/// Plan-Execute strategy.
pub type PlanExecuteStrategy = GraphStrategy<PlanExecuteGraph>;

impl StrategyGraph for PlanExecuteGraph {
    type Config = PlanExecuteConfig;

    const NAME: &'static str = "plan-execute";
    const DESCRIPTION: &'static str = "Plan-and-Execute: Writes a step-by-step plan, executes it \
        in order and replans when a step fails. \
        Best for: multi-step tasks where later steps depend on earlier results.";

    fn build(
        config: &PlanExecuteConfig,
        deps: &StrategyDeps,
    ) -> Result<CompiledStateGraph<ConversationState>, GraphError> {
        let mut graph = StateGraph::<ConversationState>::new();
        graph.add_node(
            "planner",
            Arc::new(PlanExecutePlannerNode::new(
                deps.llm.clone(),
                deps.tools.clone(),
                config.max_steps,
                config.fallback_tool.clone(),
            )),
        )?;
        graph.add_node(
            "executor",
            Arc::new(ExecutorNode::new(config.url_source_tools.clone())),
        )?;
        graph.add_node("tools", Arc::new(ToolsNode::new(deps.executor())))?;
        graph.add_node("consolidate", Arc::new(ConsolidateNode))?;
        graph.add_node("synthesize", Arc::new(SynthesizeNode::new(deps.llm.clone())))?;

        graph
            .add_edge(START, "planner")
            .add_edge("executor", "tools")
            .add_edge("tools", "consolidate")
            .add_edge("synthesize", END);
        graph.add_conditional_edges(
            "planner",
            Arc::new(|s: &ConversationState| after_plan(s).to_string()),
            path_map([("execute", "executor"), ("synthesize", "synthesize")]),
        );
        let routing = config.clone();
        graph.add_conditional_edges(
            "consolidate",
            Arc::new(move |s: &ConversationState| after_step(s, &routing).to_string()),
            path_map([
                ("execute", "executor"),
                ("replan", "planner"),
                ("synthesize", "synthesize"),
            ]),
        );
        graph.compile()
    }

    fn step_budget(config: &PlanExecuteConfig) -> usize {
        (config.max_replans as usize + 1) * (1 + 3 * config.max_steps) + 2
    }

    fn validate(config: &PlanExecuteConfig) -> Result<(), String> {
        if config.max_steps == 0 {
            return Err("max_steps must be at least 1".into());
        }
        if config.fallback_tool.trim().is_empty() {
            return Err("fallback_tool must not be empty".into());
        }
        Ok(())
    }

    fn trace_info(config: &PlanExecuteConfig, state: &ConversationState) -> Value {
        json!({
            "plan": state.plan,
            "cursor": state.cursor,
            "step_results": state.step_results,
            "replans": state.replans,
            "max_replans": config.max_replans,
            "plan_truncated": state.plan_truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Plan, Step, StepResult};

    fn state_after(output: &str, replans: u32) -> ConversationState {
        let mut state = ConversationState::default();
        state.plan = Some(Plan::new(vec![
            Step::new(1, "search", Default::default()),
            Step::new(2, "fetch", Default::default()),
        ]));
        state.cursor = 1;
        state.completed_steps.insert(1);
        state.step_results.push(StepResult {
            step_id: 1,
            tool: "search".into(),
            output: output.into(),
        });
        state.replans = replans;
        state
    }

    /// **Scenario**: triggers match as a case-insensitive prefix only.
    #[test]
    fn replan_trigger_is_prefix_match() {
        let triggers = vec!["Error".to_string()];
        assert!(is_replan_trigger("Error: not found", &triggers));
        assert!(is_replan_trigger("  error: timeout", &triggers));
        assert!(!is_replan_trigger("No error here", &triggers));
        assert!(!is_replan_trigger("anything", &[String::new()]));
    }

    /// **Scenario**: a failed step replans only while replans remain.
    #[test]
    fn after_step_respects_replan_bound() {
        let cfg = PlanExecuteConfig::default();
        assert_eq!(after_step(&state_after("Error: boom", 0), &cfg), "replan");
        assert_eq!(after_step(&state_after("Error: boom", 3), &cfg), "execute");
        assert_eq!(after_step(&state_after("ok", 0), &cfg), "execute");
    }

    /// **Scenario**: the budget grows with replans and plan length.
    #[test]
    fn step_budget_formula() {
        let cfg = PlanExecuteConfig {
            max_steps: 2,
            max_replans: 1,
            ..Default::default()
        };
        assert_eq!(PlanExecuteGraph::step_budget(&cfg), 2 * 7 + 2);
    }
}
