//! # Heddle
//!
//! A multi-strategy reasoning orchestrator: one conversation state, several
//! interchangeable policies for sequencing model calls and tool calls, each
//! expressed as a small state graph.
//!
//! ## Design principles
//!
//! - **Nodes return updates**: a node reads [`ConversationState`] and returns a sparse
//!   [`ConversationUpdate`]; the engine merges it before routing, so routers see fresh state.
//! - **Bounded runs**: every strategy derives a step budget from its config. Running out
//!   of budget ends the run with `truncated = true` and a trace marker, never an error.
//! - **Explicit registry**: [`StrategyRegistry`] is an ordinary value owned by the
//!   caller's session; switching strategies resets their counters and keeps the
//!   caller-owned history untouched.
//!
//! ## Strategies
//!
//! - **react**: agent ⇄ tools loop with an iteration cap and link following after searches.
//! - **rewoo**: plan a dependency graph once, dispatch ready steps in parallel batches, synthesize.
//! - **plan-execute**: sequential plan with a forward-only cursor and bounded replanning.
//! - **lats**: depth-bounded candidate generation, reflection and execution.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`RunContext`].
//! - [`state`]: [`ConversationState`], [`ConversationUpdate`], [`Plan`].
//! - [`agent`]: the four strategy graphs and their nodes.
//! - [`strategy`]: [`Strategy`], [`StrategyRegistry`], [`run_turn`], [`PatternSelector`].
//! - [`llm`] / [`tool_source`]: collaborator traits with [`MockLlm`] and [`MockToolSource`].
//! - [`settings`]: typed strategy configs loaded from the environment and config file.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use heddle::{run_turn, MockLlm, MockToolSource, Settings, StrategyRegistry};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = StrategyRegistry::with_defaults(
//!     Arc::new(MockLlm::with_no_tool_calls("Hello!")),
//!     Arc::new(MockToolSource::new()),
//!     &Settings::default(),
//! )?;
//! let out = run_turn(&registry, None, vec![], "Hi").await?;
//! assert_eq!(out.answer(), Some("Hello!"));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod settings;
pub mod state;
pub mod strategy;
pub mod stream;
pub mod tool_source;

pub use agent::lats::LatsStrategy;
pub use agent::plan_execute::PlanExecuteStrategy;
pub use agent::react::ReactStrategy;
pub use agent::rewoo::RewooStrategy;
pub use agent::StrategyDeps;
pub use error::AgentError;
pub use graph::{
    node_fn, path_map, CompiledStateGraph, GraphError, GraphState, Node, RunContext, RunOutcome,
    StateGraph, TraceEntry, BUDGET_EXHAUSTED, END, START,
};
pub use llm::{LlmClient, LlmResponse, MockLlm};
pub use message::{Message, ToolCall};
pub use settings::{LatsConfig, PlanExecuteConfig, ReactConfig, RewooConfig, Settings};
pub use state::{ConversationState, ConversationUpdate, Plan, PlanError, Step, StepResult};
pub use strategy::{
    run_turn, run_turn_stream, Counters, GraphStrategy, PatternSelector, Recommendation,
    RegistryError, Strategy, StrategyError, StrategyInfo, StrategyRegistry, StrategyRun,
    StrategySummary, TurnError, TurnOutput,
};
pub use stream::StreamEvent;
pub use tool_source::{
    MockToolSource, ToolCallContent, ToolExecutor, ToolSource, ToolSourceError, ToolSpec,
};

/// Serializes unit tests that mutate the process environment.
#[cfg(test)]
pub(crate) fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|p| p.into_inner())
}
