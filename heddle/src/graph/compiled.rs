//! Compiled state graph: immutable, supports invoke only.
//!
//! Built by `StateGraph::compile`. Runs from the START edge, merges each node's
//! update, resolves the next node, and stops at END or when the step budget is
//! spent. Running out of budget is not an error: the outcome carries the
//! best-effort state with `truncated = true`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::stream::StreamEvent;

use super::conditional::ConditionalRouter;
use super::logging::{
    log_budget_exhausted, log_graph_complete, log_graph_error, log_graph_start,
    log_node_complete, log_node_start, log_route,
};
use super::state_graph::END;
use super::{GraphError, GraphState, Node, RunContext};

/// Trace node name recorded when a run stops on its step budget.
pub const BUDGET_EXHAUSTED: &str = "__budget_exhausted__";

/// One line of the run trace: which node ran and what it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub node: String,
    pub description: String,
}

impl TraceEntry {
    pub fn new(node: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            description: description.into(),
        }
    }
}

/// Result of one `invoke`.
#[derive(Debug, Clone)]
pub struct RunOutcome<S> {
    pub state: S,
    pub trace: Vec<TraceEntry>,
    /// Node executions performed.
    pub steps: usize,
    /// True when the run stopped on its step budget instead of END.
    pub truncated: bool,
}

/// How to determine the next node after a given node runs.
#[derive(Clone)]
pub(super) enum NextEntry<S> {
    Unconditional(String),
    Conditional(ConditionalRouter<S>),
}

/// Compiled graph: immutable structure, reusable across runs.
#[derive(Clone)]
pub struct CompiledStateGraph<S: GraphState> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
}

impl<S: GraphState> CompiledStateGraph<S> {
    /// Runs the graph with at most `step_budget` node executions.
    pub async fn invoke(&self, state: S, step_budget: usize) -> Result<RunOutcome<S>, GraphError> {
        self.invoke_with_context(state, &RunContext::new(step_budget))
            .await
    }

    /// Runs the graph with an explicit context (budget plus optional event stream).
    pub async fn invoke_with_context(
        &self,
        mut state: S,
        ctx: &RunContext,
    ) -> Result<RunOutcome<S>, GraphError> {
        log_graph_start(ctx.step_budget);
        let mut trace = Vec::new();
        let mut steps = 0usize;
        let mut current = self.first_node_id.clone();

        while current != END {
            if steps >= ctx.step_budget {
                log_budget_exhausted(&current, steps);
                let entry = TraceEntry::new(
                    BUDGET_EXHAUSTED,
                    format!("stopped after {} node executions before '{}'", steps, current),
                );
                ctx.emit(StreamEvent::Trace(entry.clone())).await;
                trace.push(entry);
                return Ok(RunOutcome {
                    state,
                    trace,
                    steps,
                    truncated: true,
                });
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::NodeNotFound(current.clone()))?;
            log_node_start(&current, steps);
            ctx.emit(StreamEvent::NodeStarted {
                node: current.clone(),
            })
            .await;

            let update = match node.run_with_context(&state, ctx).await {
                Ok(u) => u,
                Err(source) => {
                    let err = GraphError::Node {
                        node: current.clone(),
                        source,
                    };
                    log_graph_error(&err);
                    return Err(err);
                }
            };
            let description = S::describe_update(&update);
            state.apply_update(update);
            steps += 1;
            log_node_complete(&current, &description);

            let entry = TraceEntry::new(current.clone(), description);
            ctx.emit(StreamEvent::Trace(entry.clone())).await;
            trace.push(entry);

            let next = match self.next_map.get(&current) {
                Some(NextEntry::Unconditional(to)) => to.clone(),
                Some(NextEntry::Conditional(router)) => {
                    router.resolve_next(&current, &state).map_err(|e| {
                        log_graph_error(&e);
                        e
                    })?
                }
                None => return Err(GraphError::NoPathToEnd(current)),
            };
            log_route(&current, &next);
            current = next;
        }

        log_graph_complete(steps);
        Ok(RunOutcome {
            state,
            trace,
            steps,
            truncated: false,
        })
    }
}
