//! Reasoning strategies built on the graph runtime.
//!
//! - **react**: agent ⇄ tools loop with an iteration cap and automatic link following.
//! - **rewoo**: plan a dependency graph up front, dispatch ready steps in batches, synthesize.
//! - **plan_execute**: plan, run one step at a time with a cursor, replan on failure, synthesize.
//! - **lats**: depth-bounded candidate generation, reflection and execution.
//!
//! Shared pieces: [`ToolsNode`] executes the pending calls of the last assistant
//! message, [`SynthesizeNode`] writes the final answer from step
//! results; `prompts` builds the tool guide and planner/synthesis prompts.

pub mod lats;
pub mod links;
pub mod placeholder;
pub mod plan_execute;
pub mod prompts;
pub mod react;
pub mod rewoo;
mod synthesize_node;
mod tools_node;

pub use synthesize_node::SynthesizeNode;
pub use tools_node::ToolsNode;

use std::sync::Arc;

use crate::llm::LlmClient;
use crate::tool_source::{ToolExecutor, ToolSource};

/// Collaborators every strategy graph is built from.
#[derive(Clone)]
pub struct StrategyDeps {
    pub llm: Arc<dyn LlmClient>,
    pub tools: Arc<dyn ToolSource>,
}

impl StrategyDeps {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<dyn ToolSource>) -> Self {
        Self { llm, tools }
    }

    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(self.tools.clone())
    }
}
