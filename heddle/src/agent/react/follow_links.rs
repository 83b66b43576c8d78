//! Automatic link following after web searches.
//!
//! After a tool batch, every search result in that batch is scanned for URLs.
//! Up to `max_links` URLs that no later fetch call already names are turned into
//! fetch calls. A search result fires at most once: once a fetch names one of its
//! URLs, it is skipped.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::agent::links::extract_urls;
use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::state::{ConversationState, ConversationUpdate};

/// Fetch calls to synthesize for the trailing tool batch, if any.
pub fn plan_link_fetches(
    messages: &[Message],
    search_tools: &[String],
    fetch_tool: &str,
    max_links: usize,
) -> Vec<ToolCall> {
    if max_links == 0 {
        return Vec::new();
    }
    let batch_start = messages
        .iter()
        .rposition(|m| !matches!(m, Message::Tool { .. }))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut calls = Vec::new();
    let mut picked: HashSet<String> = HashSet::new();
    for (idx, msg) in messages.iter().enumerate().skip(batch_start) {
        let Message::Tool {
            call_id,
            name,
            content,
        } = msg
        else {
            continue;
        };
        if !search_tools.iter().any(|t| t == name) {
            continue;
        }
        let candidates = extract_urls(content);
        let fetched = fetched_urls_since_call(messages, idx, call_id, fetch_tool);
        if candidates.iter().any(|u| fetched.contains(u)) {
            continue;
        }
        for url in candidates {
            if calls.len() >= max_links {
                return calls;
            }
            if picked.insert(url.clone()) {
                calls.push(ToolCall::new(
                    format!("auto-fetch-{}-{}", call_id, calls.len() + 1),
                    fetch_tool,
                    json!({ "url": url }),
                ));
            }
        }
    }
    calls
}

/// URLs named by fetch calls issued in or after the assistant turn that made `call_id`.
fn fetched_urls_since_call(
    messages: &[Message],
    result_idx: usize,
    call_id: &str,
    fetch_tool: &str,
) -> HashSet<String> {
    let issued_at = messages[..result_idx]
        .iter()
        .rposition(|m| m.tool_calls().iter().any(|c| c.id == call_id))
        .unwrap_or(result_idx);
    messages
        .iter()
        .skip(issued_at)
        .flat_map(Message::tool_calls)
        .filter(|c| c.name == fetch_tool)
        .filter_map(|c| c.arguments.get("url").and_then(|u| u.as_str()))
        .map(str::to_string)
        .collect()
}

pub struct FollowLinksNode {
    search_tools: Vec<String>,
    fetch_tool: String,
    max_links: usize,
}

impl FollowLinksNode {
    pub fn new(search_tools: Vec<String>, fetch_tool: String, max_links: usize) -> Self {
        Self {
            search_tools,
            fetch_tool,
            max_links,
        }
    }
}

#[async_trait]
impl Node<ConversationState> for FollowLinksNode {
    fn id(&self) -> &str {
        "follow_links"
    }

    async fn run(&self, state: &ConversationState) -> Result<ConversationUpdate, AgentError> {
        let calls = plan_link_fetches(
            &state.messages,
            &self.search_tools,
            &self.fetch_tool,
            self.max_links,
        );
        if calls.is_empty() {
            return Ok(ConversationUpdate::new().note("no links to follow"));
        }
        debug!(count = calls.len(), "following search result links");
        let note = format!("following {} link(s) from search results", calls.len());
        Ok(ConversationUpdate::new()
            .message(Message::assistant_with_calls(
                "Fetching the top search results.",
                calls,
            ))
            .note(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_tools() -> Vec<String> {
        vec!["web_search".to_string()]
    }

    fn searched(output: &str) -> Vec<Message> {
        vec![
            Message::user("q"),
            Message::assistant_with_calls(
                "",
                vec![ToolCall::new("s1", "web_search", json!({"query": "q"}))],
            ),
            Message::tool("s1", "web_search", output),
        ]
    }

    /// **Scenario**: at most two fetch calls are synthesized for the top URLs.
    #[test]
    fn plans_at_most_max_links() {
        let msgs = searched("URL: https://a.dev\nURL: https://b.dev\nURL: https://c.dev");
        let calls = plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "web_fetch");
        assert_eq!(calls[0].arguments["url"], "https://a.dev");
        assert_eq!(calls[1].arguments["url"], "https://b.dev");
        assert_ne!(calls[0].id, calls[1].id);
    }

    /// **Scenario**: once a fetch names a candidate URL the same search result does not fire again.
    #[test]
    fn does_not_fire_twice_for_same_result() {
        let mut msgs = searched("URL: https://a.dev\nURL: https://b.dev");
        let calls = plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2);
        msgs.push(Message::assistant_with_calls("", calls.clone()));
        for c in &calls {
            msgs.push(Message::tool(c.id.clone(), "web_fetch", "page"));
        }
        assert!(plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2).is_empty());
    }

    /// **Scenario**: a fetch the model already requested for a candidate URL suppresses the result.
    #[test]
    fn skips_result_already_fetched_by_model() {
        let msgs = vec![
            Message::user("q"),
            Message::assistant_with_calls(
                "",
                vec![
                    ToolCall::new("s1", "web_search", json!({"query": "q"})),
                    ToolCall::new("f1", "web_fetch", json!({"url": "https://a.dev"})),
                ],
            ),
            Message::tool("s1", "web_search", "URL: https://a.dev\nURL: https://b.dev"),
            Message::tool("f1", "web_fetch", "page"),
        ];
        assert!(plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2).is_empty());
    }

    /// **Scenario**: non-search tool results and results without URLs trigger nothing.
    #[test]
    fn ignores_non_search_results() {
        let msgs = vec![
            Message::user("q"),
            Message::assistant_with_calls("", vec![ToolCall::new("x", "shell_exec", json!({}))]),
            Message::tool("x", "shell_exec", "see https://a.dev"),
        ];
        assert!(plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2).is_empty());
        let msgs = searched("nothing found");
        assert!(plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2).is_empty());
    }

    /// **Scenario**: a search result from an earlier batch is not revisited.
    #[test]
    fn only_trailing_batch_is_scanned() {
        let mut msgs = searched("URL: https://a.dev");
        msgs.push(Message::assistant("thinking"));
        assert!(plan_link_fetches(&msgs, &search_tools(), "web_fetch", 2).is_empty());
    }
}
