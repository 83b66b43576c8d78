//! Integration test: strategy registry contract and switch isolation.


use std::sync::Arc;

use heddle::{
    run_turn, LlmResponse, MockLlm, MockToolSource, RegistryError, Settings, StrategyRegistry,
    ToolCall,
};
use serde_json::json;

fn registry_with(llm: MockLlm, tools: MockToolSource, settings: &Settings) -> StrategyRegistry {
    StrategyRegistry::with_defaults(Arc::new(llm), Arc::new(tools), settings).unwrap()
}

/// **Scenario**: switching A → B → A resets A's counters to their initial values.
#[tokio::test]
async fn switch_resets_counters() {
    let mut settings = Settings::default();
    settings.react.max_iterations = 2;
    settings.react.follow_links = false;
    let registry = registry_with(
        MockLlm::always(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("1", "search", json!({"query": "x"}))],
        )),
        MockToolSource::new().with_result("search", "r"),
        &settings,
    );

    run_turn(&registry, None, vec![], "go").await.unwrap();
    let react = registry.get_strategy("react").unwrap();
    assert_eq!(react.counters().iterations, 2);

    registry.switch("lats").unwrap();
    assert_eq!(react.counters().iterations, 0);
    registry.switch("react").unwrap();
    assert_eq!(registry.get_current().unwrap().counters().iterations, 0);
    assert_eq!(registry.current_name().as_deref(), Some("react"));
}

/// **Scenario**: the not-found message names the request and every registered strategy.
#[test]
fn unknown_strategy_message() {
    let registry = registry_with(
        MockLlm::with_no_tool_calls("ok"),
        MockToolSource::new(),
        &Settings::default(),
    );
    registry.unregister("lats").unwrap();
    let err = registry.set_current("tree").err().unwrap();
    assert!(matches!(err, RegistryError::NotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Strategy 'tree' not found. Available strategies: react, rewoo, plan-execute"
    );
}

/// **Scenario**: the configured startup strategy is current and the only current one.
#[test]
fn startup_strategy_from_settings() {
    let settings = Settings {
        strategy: "rewoo".into(),
        ..Default::default()
    };
    let registry = registry_with(
        MockLlm::with_no_tool_calls("ok"),
        MockToolSource::new(),
        &settings,
    );
    let current: Vec<String> = registry
        .list_strategies()
        .into_iter()
        .filter(|s| s.is_current)
        .map(|s| s.name)
        .collect();
    assert_eq!(current, vec!["rewoo".to_string()]);
    assert!(matches!(
        registry.unregister("rewoo"),
        Err(RegistryError::ActiveStrategy(_))
    ));
}

/// **Scenario**: a run keeps the caller's history and appends to it.
#[tokio::test]
async fn history_is_preserved_across_switch() {
    let registry = registry_with(
        MockLlm::with_no_tool_calls("second answer"),
        MockToolSource::new(),
        &Settings::default(),
    );
    let first = run_turn(&registry, None, vec![], "first").await.unwrap();
    registry.switch("plan-execute").unwrap();
    let history = first.messages.clone();
    let second = run_turn(&registry, Some("react"), history.clone(), "again")
        .await
        .unwrap();
    assert_eq!(&second.messages[..history.len()], &history[..]);
    assert_eq!(second.strategy, "react");
    assert_eq!(second.answer(), Some("second answer"));
}
