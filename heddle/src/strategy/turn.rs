//! Caller-facing turn API: history + user input in, extended history + trace out.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::graph::TraceEntry;
use crate::message::Message;
use crate::stream::StreamEvent;

use super::{RegistryError, Strategy, StrategyError, StrategyRegistry};

const STREAM_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub strategy: String,
    /// History, the user input and everything the strategy appended.
    pub messages: Vec<Message>,
    pub trace: Vec<TraceEntry>,
    pub info: Value,
    /// True when the strategy stopped on its step budget.
    pub truncated: bool,
}

impl TurnOutput {
    /// Last assistant content, the reply shown to the user.
    pub fn answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

fn resolve(
    registry: &StrategyRegistry,
    strategy_name: Option<&str>,
) -> Result<Arc<dyn Strategy>, RegistryError> {
    match strategy_name {
        Some(name) => registry.get_strategy(name),
        None => registry.get_current(),
    }
}

async fn execute(
    strategy: Arc<dyn Strategy>,
    mut messages: Vec<Message>,
    user_input: String,
    events: Option<mpsc::Sender<StreamEvent>>,
) -> Result<TurnOutput, TurnError> {
    messages.push(Message::user(user_input));
    let run = strategy.run(messages, events).await?;
    info!(
        steps = run.trace.len(),
        truncated = run.truncated,
        "turn finished"
    );
    Ok(TurnOutput {
        strategy: strategy.name().to_string(),
        messages: run.state.messages,
        trace: run.trace,
        info: run.info,
        truncated: run.truncated,
    })
}

/// Runs one turn with `strategy_name`, or the current strategy when `None`.
///
/// An unknown name fails before anything runs, with the registry's
/// "not found" message listing the available strategies.
pub async fn run_turn(
    registry: &StrategyRegistry,
    strategy_name: Option<&str>,
    history: Vec<Message>,
    user_input: &str,
) -> Result<TurnOutput, TurnError> {
    let strategy = resolve(registry, strategy_name)?;
    let span = info_span!(
        "run_turn",
        strategy = %strategy.name(),
        run_id = %Uuid::new_v4()
    );
    execute(strategy, history, user_input.to_string(), None)
        .instrument(span)
        .await
}

/// Like `run_turn`, but streams events while the turn runs on a spawned task.
///
/// The stream ends after `StreamEvent::Finished`; the handle yields the output.
/// The channel is bounded, so drain the stream before awaiting the handle.
/// Dropping the stream does not cancel the turn.
pub fn run_turn_stream(
    registry: &StrategyRegistry,
    strategy_name: Option<&str>,
    history: Vec<Message>,
    user_input: &str,
) -> Result<
    (
        ReceiverStream<StreamEvent>,
        JoinHandle<Result<TurnOutput, TurnError>>,
    ),
    TurnError,
> {
    let strategy = resolve(registry, strategy_name)?;
    let span = info_span!(
        "run_turn",
        strategy = %strategy.name(),
        run_id = %Uuid::new_v4(),
        streaming = true
    );
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
    let user_input = user_input.to_string();
    let handle = tokio::spawn(execute(strategy, history, user_input, Some(tx)).instrument(span));
    Ok((ReceiverStream::new(rx), handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::settings::Settings;
    use crate::tool_source::MockToolSource;

    /// **Scenario**: an unknown strategy fails before anything runs.
    #[tokio::test]
    async fn run_turn_unknown_strategy() {
        let registry = StrategyRegistry::with_defaults(
            Arc::new(MockLlm::with_no_tool_calls("hi")),
            Arc::new(MockToolSource::new()),
            &Settings::default(),
        )
        .unwrap();
        let err = run_turn(&registry, Some("nope"), vec![], "q")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("not found"));
    }
}
