//! Per-run context passed to every node: step budget and optional event sender.

use tokio::sync::mpsc;

use crate::stream::StreamEvent;

/// Context for one `invoke`. Cloned cheaply; the sender is shared.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Maximum node executions for this run.
    pub step_budget: usize,
    pub stream_tx: Option<mpsc::Sender<StreamEvent>>,
}

impl RunContext {
    pub fn new(step_budget: usize) -> Self {
        Self {
            step_budget,
            stream_tx: None,
        }
    }

    pub fn with_stream(mut self, tx: mpsc::Sender<StreamEvent>) -> Self {
        self.stream_tx = Some(tx);
        self
    }

    /// Sends an event when streaming; a closed receiver is ignored.
    pub async fn emit(&self, event: StreamEvent) {
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }
}
