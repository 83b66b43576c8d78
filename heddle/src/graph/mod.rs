//! State graph runtime: nodes return sparse updates, routers pick the next node.
//!
//! Build a `StateGraph` with `add_node` / `add_edge` / `add_conditional_edges`
//! (use `START` and `END` for entry and exit), `compile()` it, then `invoke` the
//! `CompiledStateGraph` with an initial state and a step budget. The engine
//! applies each node's update before consulting the router, so routers always
//! see fresh state, and stops after `step_budget` node executions at most.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod node;
mod run_context;
mod state_graph;

pub use compile_error::GraphError;
pub use compiled::{CompiledStateGraph, RunOutcome, TraceEntry, BUDGET_EXHAUSTED};
pub use conditional::{path_map, ConditionalRouter, ConditionalRouterFn};
pub use node::{node_fn, FnNode, Node};
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};

use std::fmt::Debug;

/// State that can be threaded through a graph and merged with node updates.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// Sparse overlay a node returns.
    type Update: Debug + Send + 'static;

    /// Merges `update` into `self`.
    fn apply_update(&mut self, update: Self::Update);

    /// One-line description of an update for the run trace.
    fn describe_update(_update: &Self::Update) -> String {
        String::new()
    }
}
