//! LATS: depth-bounded search over candidate directions.
//!
//! ```text
//! START → candidates → reflect → execute ─┬─ tools → execute
//!             ↑                           ├─ candidates (answer looks tentative)
//!             └───────────────────────────┴─ END
//! ```
//!
//! Each depth proposes `num_candidates` directions, reflection picks one
//! (`SELECTED: n`), and `execute` carries it out with tools bound, up to
//! `max_tool_rounds` tool rounds; after that `execute` answers without tools.
//! Pending tool calls always go to `tools`. The search goes one level deeper
//! when the answer is short or hedges, and never beyond `max_depth`.

mod candidates;
mod execute;
mod heuristic;
mod reflect;

pub use candidates::{parse_candidates, CandidatesNode};
pub use execute::ExecuteNode;
pub use heuristic::HedgeDetector;
pub use reflect::{parse_selection, ReflectNode};

use std::sync::Arc;

use serde_json::{json, Value};

use crate::graph::{path_map, CompiledStateGraph, GraphError, StateGraph, END, START};
use crate::settings::LatsConfig;
use crate::state::ConversationState;
use crate::strategy::{GraphStrategy, StrategyGraph};

use super::{StrategyDeps, ToolsNode};

/// Route after `execute`. Tool calls are always answered; `ExecuteNode` stops
/// requesting them once the depth's rounds are spent.
fn after_execute(
    state: &ConversationState,
    config: &LatsConfig,
    hedges: &HedgeDetector,
) -> &'static str {
    if !state.pending_tool_calls().is_empty() {
        return "tools";
    }
    if state.lats.depth >= config.max_depth {
        return "end";
    }
    let answer = state.last_message().map(|m| m.content()).unwrap_or_default();
    if hedges.needs_more(answer) {
        "expand"
    } else {
        "end"
    }
}

/// Graph blueprint for LATS.
pub struct LatsGraph;

/// LATS strategy.
pub type LatsStrategy = GraphStrategy<LatsGraph>;

impl StrategyGraph for LatsGraph {
    type Config = LatsConfig;

    const NAME: &'static str = "lats";
    const DESCRIPTION: &'static str = "LATS (Language Agent Tree Search): Proposes several \
        directions, reflects to pick the most promising one, executes it and searches deeper \
        when the answer is uncertain. Best for: open-ended or ambiguous problems.";

    fn build(
        config: &LatsConfig,
        deps: &StrategyDeps,
    ) -> Result<CompiledStateGraph<ConversationState>, GraphError> {
        let mut graph = StateGraph::<ConversationState>::new();
        graph.add_node(
            "candidates",
            Arc::new(CandidatesNode::new(deps.llm.clone(), config.num_candidates)),
        )?;
        graph.add_node(
            "execute",
            Arc::new(ExecuteNode::new(
                deps.llm.clone(),
                deps.tools.clone(),
                config.max_tool_rounds,
            )),
        )?;
        graph.add_node("tools", Arc::new(ToolsNode::new(deps.executor())))?;
        graph.add_edge(START, "candidates");
        if config.enable_reflection {
            graph.add_node("reflect", Arc::new(ReflectNode::new(deps.llm.clone())))?;
            graph
                .add_edge("candidates", "reflect")
                .add_edge("reflect", "execute");
        } else {
            graph.add_edge("candidates", "execute");
        }
        graph.add_edge("tools", "execute");

        let routing = config.clone();
        let hedges = HedgeDetector::new(&config.hedge_words, config.min_answer_chars);
        graph.add_conditional_edges(
            "execute",
            Arc::new(move |s: &ConversationState| {
                after_execute(s, &routing, &hedges).to_string()
            }),
            path_map([("tools", "tools"), ("expand", "candidates"), ("end", END)]),
        );
        graph.compile()
    }

    fn step_budget(config: &LatsConfig) -> usize {
        // candidates, reflect and one more execute than tool rounds, per depth.
        config.max_depth as usize * (3 + 2 * config.max_tool_rounds as usize) + 2
    }

    fn validate(config: &LatsConfig) -> Result<(), String> {
        if config.num_candidates == 0 {
            return Err("num_candidates must be at least 1".into());
        }
        if config.max_depth == 0 {
            return Err("max_depth must be at least 1".into());
        }
        Ok(())
    }

    fn trace_info(config: &LatsConfig, state: &ConversationState) -> Value {
        json!({
            "depth": state.lats.depth,
            "max_depth": config.max_depth,
            "candidates": state.lats.candidates,
            "selected": state.lats.selected,
            "action_history": state.lats.action_history,
        })
    }
}
