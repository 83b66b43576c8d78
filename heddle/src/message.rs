//! Message types threaded through every strategy.
//!
//! Roles: System, User, Assistant (may carry tool calls), Tool (answers one call id).
//! Nodes only append messages; routers pattern-match on the variant instead of
//! probing attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool invocation requested by the model.
///
/// `id` is the caller-assigned call id; the matching `Message::Tool` carries the
/// same id. Strategies that dispatch plan steps use the step id (ReWOO) or
/// `pe-<step id>` (Plan-Execute) so results can be matched back deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System prompt or instruction injected by a strategy.
    System { content: String },
    /// Human input.
    User { content: String },
    /// Model reply; `tool_calls` is empty when the model answers directly.
    Assistant {
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call. Error results are plain text like successes.
    Tool {
        call_id: String,
        /// Name of the tool that produced this result.
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Tool calls carried by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}

/// Content of the most recent user message, if any.
pub fn last_user_content(messages: &[Message]) -> Option<&str> {
    messages.iter().rev().find(|m| m.is_user()).map(Message::content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: constructors produce the expected variants and content accessor works for all roles.
    #[test]
    fn constructors_and_content() {
        assert!(matches!(Message::system("s"), Message::System { ref content } if content == "s"));
        assert_eq!(Message::user("u").content(), "u");
        assert_eq!(Message::assistant("a").content(), "a");
        assert_eq!(Message::tool("1", "search", "r").content(), "r");
    }

    /// **Scenario**: only assistant messages expose tool calls.
    #[test]
    fn tool_calls_only_on_assistant() {
        let call = ToolCall::new("1", "search", json!({"query": "rust"}));
        let msg = Message::assistant_with_calls("", vec![call.clone()]);
        assert_eq!(msg.tool_calls(), &[call]);
        assert!(Message::user("x").tool_calls().is_empty());
        assert!(Message::tool("1", "search", "x").tool_calls().is_empty());
    }

    /// **Scenario**: serialized messages carry a role tag.
    #[test]
    fn serde_uses_role_tag() {
        let v = serde_json::to_value(Message::tool("7", "fetch", "ok")).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["call_id"], "7");
        let back: Message = serde_json::from_value(v).unwrap();
        assert_eq!(back, Message::tool("7", "fetch", "ok"));
    }

    /// **Scenario**: last_user_content skips trailing assistant/tool messages.
    #[test]
    fn last_user_content_finds_latest_human_message() {
        let msgs = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
            Message::assistant("again"),
        ];
        assert_eq!(last_user_content(&msgs), Some("second"));
        assert_eq!(last_user_content(&[Message::assistant("x")]), None);
    }
}
