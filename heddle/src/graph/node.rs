//! Graph node trait: one step in a StateGraph.
//!
//! Receives the current state by reference and returns a sparse update; the
//! engine merges it and decides what runs next.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{GraphState, RunContext};

/// One step in a graph: state in, update out.
///
/// **Interaction**: Registered with `StateGraph::add_node`; invoked by
/// `CompiledStateGraph::invoke`. Strategy nodes call the LLM or tool collaborators
/// here; the engine itself has no side effects.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: GraphState,
{
    /// Node id (e.g. `"agent"`, `"tools"`). Must be unique within a graph.
    fn id(&self) -> &str;

    async fn run(&self, state: &S) -> Result<S::Update, AgentError>;

    /// Variant with run context (streaming sender, budget).
    ///
    /// Default implementation calls `run` and ignores the context.
    async fn run_with_context(
        &self,
        state: &S,
        _ctx: &RunContext,
    ) -> Result<S::Update, AgentError> {
        self.run(state).await
    }
}

/// Node backed by a synchronous closure. Handy for pure bookkeeping nodes and tests.
pub struct FnNode<S: GraphState> {
    id: String,
    f: Box<dyn Fn(&S) -> S::Update + Send + Sync>,
}

#[async_trait]
impl<S: GraphState> Node<S> for FnNode<S> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: &S) -> Result<S::Update, AgentError> {
        Ok((self.f)(state))
    }
}

/// Wraps a closure `(state) -> update` as a node.
pub fn node_fn<S, F>(id: impl Into<String>, f: F) -> Arc<dyn Node<S>>
where
    S: GraphState,
    F: Fn(&S) -> S::Update + Send + Sync + 'static,
{
    Arc::new(FnNode {
        id: id.into(),
        f: Box::new(f),
    })
}
