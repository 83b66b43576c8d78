//! ReAct: agent ⇄ tools loop.
//!
//! `agent` calls the LLM with tools bound; `should_continue` routes to `tools`
//! when the reply carries tool calls, or ends. The loop is capped at
//! `max_iterations` agent turns: at the cap the run ends even if the model still
//! wants tools (the answer is reported as incomplete, not as an error).
//!
//! With `follow_links`, a `follow_links` node runs after every tool batch: when
//! the batch contained a web-search result, it synthesizes up to
//! `max_followed_links` fetch calls for the top URLs before handing back to the agent.

mod agent_node;
mod follow_links;

pub use agent_node::AgentNode;
pub use follow_links::{plan_link_fetches, FollowLinksNode};

use std::sync::Arc;

use serde_json::{json, Value};

use crate::graph::{path_map, CompiledStateGraph, GraphError, StateGraph, END, START};
use crate::settings::ReactConfig;
use crate::state::ConversationState;
use crate::strategy::{GraphStrategy, StrategyGraph};

use super::{StrategyDeps, ToolsNode};

/// Route after the agent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactRoute {
    Tools,
    End,
}

impl ReactRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::End => "end",
        }
    }
}

/// Iteration cap first, then tool calls.
pub fn should_continue(state: &ConversationState, max_iterations: u32) -> ReactRoute {
    if state.iterations >= max_iterations {
        ReactRoute::End
    } else if state.pending_tool_calls().is_empty() {
        ReactRoute::End
    } else {
        ReactRoute::Tools
    }
}

/// After `follow_links`: run the synthesized fetches, or go back to the agent.
fn after_follow_links(state: &ConversationState) -> &'static str {
    if state.pending_tool_calls().is_empty() {
        "agent"
    } else {
        "tools"
    }
}

/// Graph blueprint for ReAct.
pub struct ReactGraph;

/// ReAct strategy.
pub type ReactStrategy = GraphStrategy<ReactGraph>;

impl StrategyGraph for ReactGraph {
    type Config = ReactConfig;

    const NAME: &'static str = "react";
    const DESCRIPTION: &'static str = "ReAct (Reason + Act): Iterative reasoning with tool use. \
        Thinks, calls tools, observes the results and repeats until it can answer. \
        Best for: general questions, exploratory tasks, debugging.";

    fn build(
        config: &ReactConfig,
        deps: &StrategyDeps,
    ) -> Result<CompiledStateGraph<ConversationState>, GraphError> {
        let max_iterations = config.max_iterations;
        let mut graph = StateGraph::<ConversationState>::new();
        graph.add_node(
            "agent",
            Arc::new(AgentNode::new(
                deps.llm.clone(),
                deps.tools.clone(),
                config.system_prompt.clone(),
                max_iterations,
            )),
        )?;
        graph.add_node("tools", Arc::new(ToolsNode::new(deps.executor())))?;
        graph.add_edge(START, "agent");
        graph.add_conditional_edges(
            "agent",
            Arc::new(move |s: &ConversationState| {
                should_continue(s, max_iterations).as_str().to_string()
            }),
            path_map([("tools", "tools"), ("end", END)]),
        );

        if config.follow_links {
            graph.add_node(
                "follow_links",
                Arc::new(FollowLinksNode::new(
                    config.search_tools.clone(),
                    config.fetch_tool.clone(),
                    config.max_followed_links,
                )),
            )?;
            graph.add_edge("tools", "follow_links");
            graph.add_conditional_edges(
                "follow_links",
                Arc::new(|s: &ConversationState| after_follow_links(s).to_string()),
                path_map([("tools", "tools"), ("agent", "agent")]),
            );
        } else {
            graph.add_edge("tools", "agent");
        }
        graph.compile()
    }

    fn step_budget(config: &ReactConfig) -> usize {
        // agent, tools, follow_links, tools, follow_links per iteration.
        5 * config.max_iterations as usize + 2
    }

    fn validate(config: &ReactConfig) -> Result<(), String> {
        if config.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        Ok(())
    }

    fn trace_info(config: &ReactConfig, state: &ConversationState) -> Value {
        json!({
            "iterations": state.iterations,
            "max_iterations": config.max_iterations,
            "max_iterations_reached": state.iterations >= config.max_iterations,
        })
    }
}
