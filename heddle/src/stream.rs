//! Streaming events emitted while a turn runs.
//!
//! The engine emits `NodeStarted` and `Trace` for every node; the tools node emits
//! `ToolCall` / `ToolResult` around each execution. `run_turn_stream` forwards
//! them through a bounded channel.

use serde::{Deserialize, Serialize};

use crate::graph::TraceEntry;
use crate::message::ToolCall;

/// One observable step of a running turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    NodeStarted { node: String },
    ToolCall { call: ToolCall },
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
    Trace(TraceEntry),
    /// Last event of a turn.
    Finished { truncated: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: events serialize with a snake_case type tag.
    #[test]
    fn stream_event_type_tag() {
        let v = serde_json::to_value(StreamEvent::NodeStarted {
            node: "agent".into(),
        })
        .unwrap();
        assert_eq!(v["type"], "node_started");
        assert_eq!(v["node"], "agent");
        let v = serde_json::to_value(StreamEvent::Finished { truncated: true }).unwrap();
        assert_eq!(v["type"], "finished");
    }
}
