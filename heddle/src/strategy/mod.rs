//! Strategy abstraction, registry and the caller-facing turn API.
//!
//! A `Strategy` runs a message list to completion and returns the extended state
//! plus a trace. The four built-in strategies are `GraphStrategy<G>` for a
//! `StrategyGraph` blueprint `G` (see `agent::*`): the blueprint supplies the
//! graph and its step budget, `GraphStrategy` owns config, compiled-graph cache
//! and per-run counters.

mod registry;
mod selector;
mod turn;

pub use registry::{RegistryError, StrategyInfo, StrategyRegistry, StrategySummary};
pub use selector::{PatternSelector, Recommendation};
pub use turn::{run_turn, run_turn_stream, TurnError, TurnOutput};

use std::fmt::Debug;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::agent::StrategyDeps;
use crate::graph::{CompiledStateGraph, GraphError, RunContext, TraceEntry};
use crate::message::Message;
use crate::state::ConversationState;
use crate::stream::StreamEvent;

/// Errors from running or configuring a strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Counters a strategy keeps from its last run. Zeroed on reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub iterations: u32,
    pub depth: u32,
    pub replans: u32,
    pub steps: usize,
}

impl Counters {
    fn from_run(state: &ConversationState, steps: usize) -> Self {
        Self {
            iterations: state.iterations,
            depth: state.lats.depth,
            replans: state.replans,
            steps,
        }
    }
}

/// Result of one strategy run.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub state: ConversationState,
    pub trace: Vec<TraceEntry>,
    /// True when the step budget stopped the run.
    pub truncated: bool,
    /// Strategy-specific details (iteration count, plan, depth, ...).
    pub info: Value,
}

/// A pluggable policy for sequencing model calls and tool calls.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Current configuration as JSON.
    fn config(&self) -> Value;

    /// Merges the keys of a JSON object into the configuration.
    fn update_config(&self, patch: &Value) -> Result<(), StrategyError>;

    fn supports_streaming(&self) -> bool {
        true
    }

    /// Counters from the last run since the last reset.
    fn counters(&self) -> Counters;

    /// Zeroes the counters. Called by the registry on every switch.
    fn reset(&self);

    /// Runs `messages` to completion. Events are sent to `events` when given.
    async fn run(
        &self,
        messages: Vec<Message>,
        events: Option<mpsc::Sender<StreamEvent>>,
    ) -> Result<StrategyRun, StrategyError>;
}

/// Strategy-specific graph construction.
pub trait StrategyGraph: Send + Sync + 'static {
    type Config: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn build(
        config: &Self::Config,
        deps: &StrategyDeps,
    ) -> Result<CompiledStateGraph<ConversationState>, GraphError>;

    /// Node executions allowed per run; derived from the config limits only.
    fn step_budget(config: &Self::Config) -> usize;

    fn validate(_config: &Self::Config) -> Result<(), String> {
        Ok(())
    }

    /// Details reported with the run (plan, counters, markers).
    fn trace_info(config: &Self::Config, state: &ConversationState) -> Value;
}

/// Config plus the graph compiled from it. Kept under one lock so a run never
/// pairs a graph with a config it was not built from.
struct Slot<G: StrategyGraph> {
    config: G::Config,
    graph: Option<Arc<CompiledStateGraph<ConversationState>>>,
}

/// A strategy backed by a compiled state graph.
pub struct GraphStrategy<G: StrategyGraph> {
    deps: StrategyDeps,
    slot: RwLock<Slot<G>>,
    counters: Mutex<Counters>,
}

impl<G: StrategyGraph> GraphStrategy<G> {
    pub fn new(deps: StrategyDeps, config: G::Config) -> Self {
        Self {
            deps,
            slot: RwLock::new(Slot {
                config,
                graph: None,
            }),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn current_config(&self) -> G::Config {
        self.slot
            .read()
            .map(|s| s.config.clone())
            .unwrap_or_else(|p| p.into_inner().config.clone())
    }

    /// Config and matching compiled graph, building the graph on first use or
    /// after a config change.
    fn snapshot(
        &self,
    ) -> Result<(G::Config, Arc<CompiledStateGraph<ConversationState>>), GraphError> {
        {
            let slot = self.slot.read().unwrap_or_else(|p| p.into_inner());
            if let Some(g) = slot.graph.as_ref() {
                return Ok((slot.config.clone(), g.clone()));
            }
        }
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        if let Some(g) = slot.graph.as_ref() {
            return Ok((slot.config.clone(), g.clone()));
        }
        debug!(strategy = G::NAME, "compiling strategy graph");
        let compiled = Arc::new(G::build(&slot.config, &self.deps)?);
        slot.graph = Some(compiled.clone());
        Ok((slot.config.clone(), compiled))
    }

    fn set_counters(&self, counters: Counters) {
        *self.counters.lock().unwrap_or_else(|p| p.into_inner()) = counters;
    }
}

#[async_trait]
impl<G: StrategyGraph> Strategy for GraphStrategy<G> {
    fn name(&self) -> &str {
        G::NAME
    }

    fn description(&self) -> &str {
        G::DESCRIPTION
    }

    fn config(&self) -> Value {
        serde_json::to_value(self.current_config()).unwrap_or(Value::Null)
    }

    fn update_config(&self, patch: &Value) -> Result<(), StrategyError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| StrategyError::InvalidConfig("patch must be a JSON object".into()))?;
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        let mut merged = serde_json::to_value(&slot.config)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        let target = merged
            .as_object_mut()
            .ok_or_else(|| StrategyError::InvalidConfig("config is not an object".into()))?;
        for (k, v) in patch {
            if !target.contains_key(k) {
                return Err(StrategyError::InvalidConfig(format!("unknown key '{}'", k)));
            }
            target.insert(k.clone(), v.clone());
        }
        let updated: G::Config = serde_json::from_value(merged)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        G::validate(&updated).map_err(StrategyError::InvalidConfig)?;

        slot.config = updated;
        slot.graph = None;
        drop(slot);
        debug!(strategy = G::NAME, "config updated");
        Ok(())
    }

    fn counters(&self) -> Counters {
        *self.counters.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn reset(&self) {
        self.set_counters(Counters::default());
    }

    async fn run(
        &self,
        messages: Vec<Message>,
        events: Option<mpsc::Sender<StreamEvent>>,
    ) -> Result<StrategyRun, StrategyError> {
        self.reset();
        let (config, graph) = self.snapshot()?;
        let mut ctx = RunContext::new(G::step_budget(&config));
        if let Some(tx) = events {
            ctx = ctx.with_stream(tx);
        }

        let outcome = graph
            .invoke_with_context(ConversationState::new(messages), &ctx)
            .await?;
        self.set_counters(Counters::from_run(&outcome.state, outcome.steps));
        ctx.emit(StreamEvent::Finished {
            truncated: outcome.truncated,
        })
        .await;

        let mut info = G::trace_info(&config, &outcome.state);
        if let Value::Object(map) = &mut info {
            map.insert("steps".into(), outcome.steps.into());
            map.insert("truncated".into(), outcome.truncated.into());
        }
        Ok(StrategyRun {
            info,
            trace: outcome.trace,
            truncated: outcome.truncated,
            state: outcome.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::agent::react::ReactStrategy;
    use crate::llm::{LlmResponse, MockLlm};
    use crate::message::ToolCall;
    use crate::settings::ReactConfig;
    use crate::tool_source::MockToolSource;

    fn looping_react(max_iterations: u32) -> ReactStrategy {
        let llm = MockLlm::always(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("1", "search", json!({"query": "x"}))],
        ));
        let tools = MockToolSource::new().with_result("search", "r");
        ReactStrategy::new(
            StrategyDeps::new(Arc::new(llm), Arc::new(tools)),
            ReactConfig {
                max_iterations,
                follow_links: false,
                ..Default::default()
            },
        )
    }

    /// **Scenario**: a config update drops the cached graph, and the next snapshot pairs the
    /// new config with a graph built from it.
    #[test]
    fn config_update_rebuilds_graph_with_new_config() {
        let strategy = looping_react(3);
        let (before_cfg, before) = strategy.snapshot().unwrap();
        let (_, cached) = strategy.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &cached));
        assert_eq!(before_cfg.max_iterations, 3);

        strategy
            .update_config(&json!({"max_iterations": 1}))
            .unwrap();
        let (after_cfg, after) = strategy.snapshot().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after_cfg.max_iterations, 1);
    }

    /// **Scenario**: a run after a config update follows the updated limits.
    #[tokio::test]
    async fn run_uses_updated_config() {
        let strategy = looping_react(3);
        strategy.run(vec![Message::user("q")], None).await.unwrap();
        assert_eq!(strategy.counters().iterations, 3);

        strategy
            .update_config(&json!({"max_iterations": 1}))
            .unwrap();
        let run = strategy.run(vec![Message::user("q")], None).await.unwrap();
        assert_eq!(strategy.counters().iterations, 1);
        assert_eq!(run.info["max_iterations"], 1);
    }

    /// **Scenario**: unknown keys and invalid values leave the config untouched.
    #[test]
    fn rejected_patch_keeps_config() {
        let strategy = looping_react(3);
        assert!(strategy.update_config(&json!({"nope": 1})).is_err());
        assert!(strategy.update_config(&json!({"max_iterations": 0})).is_err());
        assert!(strategy.update_config(&json!(5)).is_err());
        assert_eq!(strategy.current_config().max_iterations, 3);
    }
}
