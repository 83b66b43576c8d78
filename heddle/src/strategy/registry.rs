//! Strategy registry: named strategy instances and the current selection.
//!
//! An explicit value owned by the caller's session (no process-wide state).
//! Interior locking lets a shared `Arc<StrategyRegistry>` be switched while
//! runs are in flight; a run keeps the `Arc<dyn Strategy>` it started with.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::agent::lats::LatsStrategy;
use crate::agent::plan_execute::PlanExecuteStrategy;
use crate::agent::react::ReactStrategy;
use crate::agent::rewoo::RewooStrategy;
use crate::agent::StrategyDeps;
use crate::llm::LlmClient;
use crate::settings::Settings;
use crate::tool_source::ToolSource;

use super::{Strategy, StrategyError};

/// Registry errors. Messages are shown to end users as is.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Strategy '{name}' not found. Available strategies: {}", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },
    #[error("Strategy '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("Cannot unregister '{0}' because it is the current strategy. Switch to another strategy first.")]
    ActiveStrategy(String),
    #[error("No strategies registered")]
    Empty,
    #[error("Strategy '{name}': {source}")]
    Config {
        name: String,
        #[source]
        source: StrategyError,
    },
}

/// One row of `list()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub name: String,
    pub description: String,
    pub is_current: bool,
}

/// Details returned by `get_strategy_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub config: Value,
    pub supports_streaming: bool,
    pub is_current: bool,
}

#[derive(Default)]
struct Inner {
    /// Registration order is listing order.
    entries: Vec<(String, Arc<dyn Strategy>)>,
    current: Option<String>,
}

impl Inner {
    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    fn find(&self, name: &str) -> Result<Arc<dyn Strategy>, RegistryError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
                available: self.names(),
            })
    }
}

/// Named strategies with exactly one current strategy once any is registered.
#[derive(Default)]
pub struct StrategyRegistry {
    inner: RwLock<Inner>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in strategies configured from `settings`;
    /// the current strategy is `settings.strategy`.
    pub fn with_defaults(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        settings: &Settings,
    ) -> Result<Self, RegistryError> {
        let deps = StrategyDeps::new(llm, tools);
        let registry = Self::new();
        registry.register(Arc::new(ReactStrategy::new(deps.clone(), settings.react.clone())))?;
        registry.register(Arc::new(RewooStrategy::new(deps.clone(), settings.rewoo.clone())))?;
        registry.register(Arc::new(PlanExecuteStrategy::new(
            deps.clone(),
            settings.plan_execute.clone(),
        )))?;
        registry.register(Arc::new(LatsStrategy::new(deps, settings.lats.clone())))?;
        registry.set_current(&settings.strategy)?;
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Adds a strategy under its own name. The first one registered becomes current.
    pub fn register(&self, strategy: Arc<dyn Strategy>) -> Result<(), RegistryError> {
        let name = strategy.name().to_string();
        let mut inner = self.write();
        if inner.entries.iter().any(|(n, _)| *n == name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        if inner.current.is_none() {
            inner.current = Some(name.clone());
        }
        inner.entries.push((name.clone(), strategy));
        debug!(strategy = %name, "strategy registered");
        Ok(())
    }

    /// Removes a strategy. The current strategy cannot be removed.
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn Strategy>, RegistryError> {
        let mut inner = self.write();
        let strategy = inner.find(name)?;
        if inner.current.as_deref() == Some(name) {
            return Err(RegistryError::ActiveStrategy(name.to_string()));
        }
        inner.entries.retain(|(n, _)| n != name);
        debug!(strategy = %name, "strategy unregistered");
        Ok(strategy)
    }

    pub fn get_strategy(&self, name: &str) -> Result<Arc<dyn Strategy>, RegistryError> {
        self.read().find(name)
    }

    pub fn get_current(&self) -> Result<Arc<dyn Strategy>, RegistryError> {
        let inner = self.read();
        let name = inner.current.as_deref().ok_or(RegistryError::Empty)?;
        inner.find(name)
    }

    pub fn current_name(&self) -> Option<String> {
        self.read().current.clone()
    }

    /// Makes `name` current. Counters of the previous and the new strategy are reset.
    pub fn set_current(&self, name: &str) -> Result<(), RegistryError> {
        let mut inner = self.write();
        let next = inner.find(name)?;
        let previous = inner
            .current
            .as_deref()
            .and_then(|n| inner.find(n).ok());
        if let Some(previous) = previous {
            previous.reset();
        }
        next.reset();
        let from = inner.current.replace(name.to_string());
        info!(from = ?from, to = %name, "strategy switched");
        Ok(())
    }

    /// Same as `set_current`.
    pub fn switch(&self, name: &str) -> Result<(), RegistryError> {
        self.set_current(name)
    }

    /// Every registered strategy in registration order.
    pub fn list(&self) -> Vec<StrategySummary> {
        let inner = self.read();
        inner
            .entries
            .iter()
            .map(|(name, s)| StrategySummary {
                name: name.clone(),
                description: s.description().to_string(),
                is_current: inner.current.as_deref() == Some(name.as_str()),
            })
            .collect()
    }

    pub fn list_strategies(&self) -> Vec<StrategySummary> {
        self.list()
    }

    pub fn get_strategy_info(&self, name: &str) -> Result<StrategyInfo, RegistryError> {
        let inner = self.read();
        let strategy = inner.find(name)?;
        Ok(StrategyInfo {
            name: name.to_string(),
            description: strategy.description().to_string(),
            config: strategy.config(),
            supports_streaming: strategy.supports_streaming(),
            is_current: inner.current.as_deref() == Some(name),
        })
    }

    /// Merges `patch` into the named strategy's config.
    pub fn update_strategy_config(&self, name: &str, patch: &Value) -> Result<(), RegistryError> {
        let strategy = self.get_strategy(name)?;
        strategy
            .update_config(patch)
            .map_err(|source| RegistryError::Config {
                name: name.to_string(),
                source,
            })
    }

    /// Applies per-strategy config tables, e.g. `[strategies.react]` from the config file.
    pub fn apply_overrides(&self, overrides: &HashMap<String, Value>) -> Result<(), RegistryError> {
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();
        for name in names {
            self.update_strategy_config(name, &overrides[name])?;
        }
        Ok(())
    }
}
