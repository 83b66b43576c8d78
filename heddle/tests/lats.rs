//! Integration test: LATS depth bound, early acceptance and tool rounds.


use std::sync::Arc;

use heddle::{
    LatsConfig, LatsStrategy, LlmResponse, Message, MockLlm, MockToolSource, Strategy,
    StrategyDeps, ToolCall,
};
use serde_json::json;

const CONFIDENT: &str =
    "Paris is the capital of France and has been the seat of government for centuries.";

/// **Scenario**: an answer that always hedges stops at `max_depth`, not on the step budget.
#[tokio::test]
async fn lats_stops_at_max_depth() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("1. maybe try this"));
    let config = LatsConfig {
        max_depth: 3,
        ..Default::default()
    };
    let strategy = LatsStrategy::new(
        StrategyDeps::new(llm.clone(), Arc::new(MockToolSource::new())),
        config,
    );

    let run = strategy.run(vec![Message::user("q")], None).await.unwrap();

    assert!(!run.truncated);
    assert_eq!(run.info["depth"], 3);
    assert_eq!(strategy.counters().depth, 3);
    // candidates, reflect, execute per depth
    assert_eq!(llm.call_count(), 9);
    assert_eq!(run.state.lats.action_history.len(), 3);
}

/// **Scenario**: a long, confident answer ends the search at depth 1 with the reflected pick.
#[tokio::test]
async fn lats_accepts_confident_answer() {
    let llm = Arc::new(MockLlm::scripted(vec![
        LlmResponse::text("1. Look it up\n2. Recall it"),
        LlmResponse::text("The second is enough.\nSELECTED: 2"),
        LlmResponse::text(CONFIDENT),
    ]));
    let strategy = LatsStrategy::new(
        StrategyDeps::new(llm.clone(), Arc::new(MockToolSource::new())),
        LatsConfig::default(),
    );

    let run = strategy.run(vec![Message::user("capital of France?")], None).await.unwrap();

    assert_eq!(run.info["depth"], 1);
    assert_eq!(run.info["selected"], 1);
    assert_eq!(run.state.final_answer(), Some(CONFIDENT));
    assert_eq!(llm.call_count(), 3);
    let execute_prompt = llm.recorded()[2].messages[0].content().to_string();
    assert!(execute_prompt.contains("Recall it"));
}

/// **Scenario**: tool rounds per depth are bounded by `max_tool_rounds`.
#[tokio::test]
async fn lats_bounds_tool_rounds() {
    let llm = Arc::new(MockLlm::scripted(vec![
        LlmResponse::text("1. Search"),
        LlmResponse::text("SELECTED: 1"),
        LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("c", "search", json!({"query": "x"}))],
        ),
    ]));
    let tools = Arc::new(MockToolSource::new().with_result("search", "r"));
    let config = LatsConfig {
        max_depth: 1,
        max_tool_rounds: 2,
        ..Default::default()
    };
    let strategy = LatsStrategy::new(StrategyDeps::new(llm, tools.clone()), config);

    let run = strategy.run(vec![Message::user("q")], None).await.unwrap();

    assert_eq!(tools.call_count("search"), 2);
    assert_eq!(run.info["depth"], 1);
    assert!(!run.truncated);
    assert_eq!(run.state.final_answer(), Some("r"));
}

fn unanswered_calls(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .flat_map(|m| m.tool_calls())
        .filter(|call| {
            !messages
                .iter()
                .any(|m| matches!(m, Message::Tool { call_id, .. } if *call_id == call.id))
        })
        .map(|call| call.id.clone())
        .collect()
}

/// **Scenario**: a model that keeps requesting tools still gets every call answered, and
/// the run ends with a non-empty answer once the rounds of the last depth are spent.
#[tokio::test]
async fn lats_answers_every_tool_call() {
    let llm = Arc::new(MockLlm::always(LlmResponse::with_tool_calls(
        "",
        vec![ToolCall::new("s", "search", json!({"query": "tokio"}))],
    )));
    let tools = Arc::new(MockToolSource::new().with_result("search", "Tokio is a runtime."));
    let config = LatsConfig {
        max_depth: 2,
        max_tool_rounds: 1,
        enable_reflection: false,
        ..Default::default()
    };
    let strategy = LatsStrategy::new(StrategyDeps::new(llm.clone(), tools.clone()), config);

    let run = strategy.run(vec![Message::user("what is tokio?")], None).await.unwrap();

    assert!(!run.truncated);
    assert_eq!(run.info["depth"], 2);
    // candidates, execute with tools, execute without tools, per depth
    assert_eq!(llm.call_count(), 6);
    assert_eq!(tools.call_count("search"), 2);
    for call in llm.recorded() {
        assert!(unanswered_calls(&call.messages).is_empty());
    }
    assert!(unanswered_calls(&run.state.messages).is_empty());
    assert_eq!(run.state.final_answer(), Some("Tokio is a runtime."));
    assert!(!llm.recorded()[5].tools_bound);
}

/// **Scenario**: with reflection disabled the first candidate is executed.
#[tokio::test]
async fn lats_without_reflection() {
    let llm = Arc::new(MockLlm::scripted(vec![
        LlmResponse::text("1. Only idea"),
        LlmResponse::text(CONFIDENT),
    ]));
    let config = LatsConfig {
        enable_reflection: false,
        ..Default::default()
    };
    let strategy = LatsStrategy::new(
        StrategyDeps::new(llm.clone(), Arc::new(MockToolSource::new())),
        config,
    );

    let run = strategy.run(vec![Message::user("q")], None).await.unwrap();

    assert_eq!(llm.call_count(), 2);
    assert!(run.trace.iter().all(|t| t.node != "reflect"));
    assert!(llm.recorded()[1].messages[0].content().contains("Only idea"));
}
