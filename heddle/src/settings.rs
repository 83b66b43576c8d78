//! Typed strategy configuration.
//!
//! Each strategy owns a serde-serializable config; `Settings::from_env` reads
//! the `HEDDLE_*` variables (after `env_config::load_and_apply` has merged
//! `.env` and the XDG config file into the environment).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// ReAct loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactConfig {
    /// Agent turns before the loop is forced to end.
    pub max_iterations: u32,
    /// Fetch top search results automatically after a search call.
    pub follow_links: bool,
    pub max_followed_links: usize,
    /// Tool names whose output is scanned for links.
    pub search_tools: Vec<String>,
    /// Tool used for the synthesized fetch calls.
    pub fetch_tool: String,
    /// Replaces the default system prompt when set.
    pub system_prompt: Option<String>,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            follow_links: true,
            max_followed_links: 2,
            search_tools: vec![
                "search".to_string(),
                "web_search".to_string(),
                "ddgs_search".to_string(),
            ],
            fetch_tool: "web_fetch".to_string(),
            system_prompt: None,
        }
    }
}

/// ReWOO planner/scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewooConfig {
    /// Plans longer than this are cut (the trace records the cut).
    pub max_steps: usize,
    /// Tool of the single-step plan used when planning fails.
    pub fallback_tool: String,
}

impl Default for RewooConfig {
    fn default() -> Self {
        Self {
            max_steps: 12,
            fallback_tool: "search".to_string(),
        }
    }
}

/// Plan-Execute configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanExecuteConfig {
    pub max_steps: usize,
    /// Replans allowed per run; 0 disables replanning.
    pub max_replans: u32,
    /// A step output starting with one of these (case-insensitive) triggers a replan.
    pub replan_triggers: Vec<String>,
    pub fallback_tool: String,
    /// Tools whose latest output fills a relative `url` argument of a step without
    /// declared dependencies.
    pub url_source_tools: Vec<String>,
}

impl Default for PlanExecuteConfig {
    fn default() -> Self {
        Self {
            max_steps: 12,
            max_replans: 3,
            replan_triggers: vec!["Error".to_string()],
            fallback_tool: "search".to_string(),
            url_source_tools: vec![
                "search".to_string(),
                "web_search".to_string(),
                "ddgs_search".to_string(),
            ],
        }
    }
}

/// LATS search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatsConfig {
    pub num_candidates: usize,
    pub max_depth: u32,
    pub enable_reflection: bool,
    /// Words that mark an answer as tentative.
    pub hedge_words: Vec<String>,
    /// Answers at least this long without hedging are final.
    pub min_answer_chars: usize,
    /// Tool rounds allowed per depth.
    pub max_tool_rounds: u32,
}

impl Default for LatsConfig {
    fn default() -> Self {
        Self {
            num_candidates: 3,
            max_depth: 5,
            enable_reflection: true,
            hedge_words: ["however", "but", "alternatively", "maybe", "might"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_answer_chars: 50,
            max_tool_rounds: 3,
        }
    }
}

/// All strategy configs plus the strategy selected at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub strategy: String,
    pub react: ReactConfig,
    pub rewoo: RewooConfig,
    pub plan_execute: PlanExecuteConfig,
    pub lats: LatsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: "react".to_string(),
            react: ReactConfig::default(),
            rewoo: RewooConfig::default(),
            plan_execute: PlanExecuteConfig::default(),
            lats: LatsConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Settings {
    /// Builds settings from environment variables; unset or unparsable values keep defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            strategy: std::env::var("HEDDLE_STRATEGY").unwrap_or(d.strategy),
            react: ReactConfig {
                max_iterations: env_parse("HEDDLE_REACT_MAX_ITERATIONS")
                    .unwrap_or(d.react.max_iterations),
                follow_links: env_parse("HEDDLE_REACT_FOLLOW_LINKS")
                    .unwrap_or(d.react.follow_links),
                system_prompt: std::env::var("HEDDLE_REACT_SYSTEM_PROMPT").ok(),
                ..d.react
            },
            rewoo: RewooConfig {
                max_steps: env_parse("HEDDLE_REWOO_MAX_STEPS").unwrap_or(d.rewoo.max_steps),
                ..d.rewoo
            },
            plan_execute: PlanExecuteConfig {
                max_replans: env_parse("HEDDLE_PLAN_EXECUTE_MAX_REPLANS")
                    .unwrap_or(d.plan_execute.max_replans),
                ..d.plan_execute
            },
            lats: LatsConfig {
                num_candidates: env_parse("HEDDLE_LATS_NUM_CANDIDATES")
                    .unwrap_or(d.lats.num_candidates),
                max_depth: env_parse("HEDDLE_LATS_MAX_DEPTH").unwrap_or(d.lats.max_depth),
                enable_reflection: env_parse("HEDDLE_LATS_ENABLE_REFLECTION")
                    .unwrap_or(d.lats.enable_reflection),
                ..d.lats
            },
        }
    }

    /// Merges `.env` and `$XDG_CONFIG_HOME/heddle/config.toml` into the process
    /// environment, then reads settings from it.
    pub fn load(override_dir: Option<&Path>) -> Result<Self, env_config::LoadError> {
        let applied = env_config::load_and_apply("heddle", override_dir)?;
        if !applied.is_empty() {
            debug!(keys = ?applied, "environment filled from config files");
        }
        Ok(Self::from_env())
    }

    /// Per-strategy config patches, ready for `StrategyRegistry::apply_overrides`:
    /// the `[strategies.<name>]` tables of the XDG config file with
    /// `HEDDLE__<STRATEGY>__<KEY>` variables applied on top.
    pub fn strategy_overrides() -> Result<HashMap<String, serde_json::Value>, env_config::LoadError>
    {
        env_config::strategy_patches("heddle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: defaults match the documented limits.
    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.strategy, "react");
        assert_eq!(s.react.max_iterations, 20);
        assert_eq!(s.react.max_followed_links, 2);
        assert_eq!(s.plan_execute.max_replans, 3);
        assert_eq!(s.lats.num_candidates, 3);
        assert_eq!(s.lats.max_depth, 5);
        assert!(s.lats.enable_reflection);
        assert!(s.lats.hedge_words.contains(&"alternatively".to_string()));
    }

    /// **Scenario**: HEDDLE_* variables override defaults; garbage values are ignored.
    #[test]
    fn from_env_reads_overrides() {
        let _guard = crate::test_env_lock();
        std::env::set_var("HEDDLE_LATS_MAX_DEPTH", "2");
        std::env::set_var("HEDDLE_REWOO_MAX_STEPS", "not-a-number");
        let s = Settings::from_env();
        std::env::remove_var("HEDDLE_LATS_MAX_DEPTH");
        std::env::remove_var("HEDDLE_REWOO_MAX_STEPS");
        assert_eq!(s.lats.max_depth, 2);
        assert_eq!(s.rewoo.max_steps, 12);
    }

    /// **Scenario**: with no HEDDLE_* variables set, every field keeps its default.
    #[test]
    fn from_env_without_variables_is_default() {
        let _guard = crate::test_env_lock();
        let keys = [
            "HEDDLE_STRATEGY",
            "HEDDLE_REACT_MAX_ITERATIONS",
            "HEDDLE_REACT_FOLLOW_LINKS",
            "HEDDLE_REACT_SYSTEM_PROMPT",
            "HEDDLE_REWOO_MAX_STEPS",
            "HEDDLE_PLAN_EXECUTE_MAX_REPLANS",
            "HEDDLE_LATS_NUM_CANDIDATES",
            "HEDDLE_LATS_MAX_DEPTH",
            "HEDDLE_LATS_ENABLE_REFLECTION",
        ];
        let saved: Vec<_> = keys.iter().map(|k| (k, std::env::var(k).ok())).collect();
        for k in keys {
            std::env::remove_var(k);
        }
        let s = Settings::from_env();
        for (k, v) in saved {
            if let Some(v) = v {
                std::env::set_var(k, v);
            }
        }
        assert_eq!(s, Settings::default());
    }

    /// **Scenario**: partial JSON deserializes with defaults for missing fields.
    #[test]
    fn partial_config_uses_defaults() {
        let c: LatsConfig = serde_json::from_value(serde_json::json!({"max_depth": 1})).unwrap();
        assert_eq!(c.max_depth, 1);
        assert_eq!(c.num_candidates, 3);
    }
}
