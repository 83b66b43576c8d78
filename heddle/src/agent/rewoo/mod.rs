//! ReWOO: plan once, execute the plan as a dependency graph, synthesize.
//!
//! ```text
//! START → planner → expand_ready ─┬─ tools → collect ─┬─ expand_ready
//!                                 └─ synthesize       └─ synthesize → END
//! ```
//!
//! The planner writes a `Plan` whose steps declare `depends_on`. `expand_ready`
//! dispatches every ready step as one batch of tool calls (call id = step id),
//! `tools` runs them concurrently and `collect` records each result once.
//! The loop ends when the plan is complete or nothing more can be dispatched;
//! `synthesize` then answers from the results.

mod collect;
mod expand;
mod planner;

pub use collect::CollectNode;
pub use expand::ExpandReadyNode;
pub use planner::RewooPlannerNode;

use std::sync::Arc;

use serde_json::{json, Value};

use crate::graph::{path_map, CompiledStateGraph, GraphError, StateGraph, END, START};
use crate::settings::RewooConfig;
use crate::state::ConversationState;
use crate::strategy::{GraphStrategy, StrategyGraph};

use super::{StrategyDeps, SynthesizeNode, ToolsNode};

/// After `expand_ready`: run the dispatched batch or finish.
fn after_expand(state: &ConversationState) -> &'static str {
    if state.pending_tool_calls().is_empty() {
        "synthesize"
    } else {
        "tools"
    }
}

/// After `collect`: keep scheduling until every step has a result.
fn after_collect(state: &ConversationState) -> &'static str {
    match &state.plan {
        Some(plan) if !plan.is_complete(&state.completed_steps) => "expand",
        _ => "synthesize",
    }
}

/// Graph blueprint for ReWOO.
pub struct RewooGraph;

/// ReWOO strategy.
pub type RewooStrategy = GraphStrategy<RewooGraph>;

impl StrategyGraph for RewooGraph {
    type Config = RewooConfig;

    const NAME: &'static str = "rewoo";
    const DESCRIPTION: &'static str = "ReWOO (Reasoning WithOut Observation): Plans every tool call \
        up front as a dependency graph, runs independent steps in parallel, then synthesizes. \
        Best for: multi-source research, tasks with predictable steps.";

    fn build(
        config: &RewooConfig,
        deps: &StrategyDeps,
    ) -> Result<CompiledStateGraph<ConversationState>, GraphError> {
        let mut graph = StateGraph::<ConversationState>::new();
        graph.add_node(
            "planner",
            Arc::new(RewooPlannerNode::new(
                deps.llm.clone(),
                deps.tools.clone(),
                config.max_steps,
                config.fallback_tool.clone(),
            )),
        )?;
        graph.add_node("expand_ready", Arc::new(ExpandReadyNode))?;
        graph.add_node("tools", Arc::new(ToolsNode::new(deps.executor())))?;
        graph.add_node("collect", Arc::new(CollectNode))?;
        graph.add_node("synthesize", Arc::new(SynthesizeNode::new(deps.llm.clone())))?;

        graph
            .add_edge(START, "planner")
            .add_edge("planner", "expand_ready")
            .add_edge("tools", "collect")
            .add_edge("synthesize", END);
        graph.add_conditional_edges(
            "expand_ready",
            Arc::new(|s: &ConversationState| after_expand(s).to_string()),
            path_map([("tools", "tools"), ("synthesize", "synthesize")]),
        );
        graph.add_conditional_edges(
            "collect",
            Arc::new(|s: &ConversationState| after_collect(s).to_string()),
            path_map([("expand", "expand_ready"), ("synthesize", "synthesize")]),
        );
        graph.compile()
    }

    fn step_budget(config: &RewooConfig) -> usize {
        3 * config.max_steps + 4
    }

    fn validate(config: &RewooConfig) -> Result<(), String> {
        if config.max_steps == 0 {
            return Err("max_steps must be at least 1".into());
        }
        if config.fallback_tool.trim().is_empty() {
            return Err("fallback_tool must not be empty".into());
        }
        Ok(())
    }

    fn trace_info(_config: &RewooConfig, state: &ConversationState) -> Value {
        json!({
            "plan": state.plan,
            "step_results": state.results_in_plan_order(),
            "plan_truncated": state.plan_truncated,
        })
    }
}
