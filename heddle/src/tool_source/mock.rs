//! Mock tool source for tests and demos.
//!
//! Results are canned per tool name, optionally per exact argument value. Every
//! call is recorded so tests can count executions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Canned tool source.
#[derive(Default)]
pub struct MockToolSource {
    specs: Vec<ToolSpec>,
    results: HashMap<String, String>,
    by_args: HashMap<(String, String), String>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` returning `text` for any arguments.
    pub fn with_result(mut self, name: &str, text: impl Into<String>) -> Self {
        self.register(name);
        self.results.insert(name.to_string(), text.into());
        self
    }

    /// Registers `name` returning `text` when called with exactly `args`.
    pub fn with_result_for(mut self, name: &str, args: Value, text: impl Into<String>) -> Self {
        self.register(name);
        self.by_args
            .insert((name.to_string(), args.to_string()), text.into());
        self
    }

    /// Registers `name` failing with `message`.
    pub fn with_failure(mut self, name: &str, message: impl Into<String>) -> Self {
        self.register(name);
        self.failures.insert(name.to_string(), message.into());
        self
    }

    fn register(&mut self, name: &str) {
        if !self.specs.iter().any(|s| s.name == name) {
            self.specs
                .push(ToolSpec::new(name, format!("mock tool {}", name)));
        }
    }

    /// Every `(tool, arguments)` pair received so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|(n, _)| n == name).count()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.specs.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((name.to_string(), arguments.clone()));

        if let Some(msg) = self.failures.get(name) {
            return Err(ToolSourceError::Failed(msg.clone()));
        }
        if let Some(text) = self.by_args.get(&(name.to_string(), arguments.to_string())) {
            return Ok(ToolCallContent { text: text.clone() });
        }
        self.results
            .get(name)
            .map(|text| ToolCallContent { text: text.clone() })
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))
    }
}
