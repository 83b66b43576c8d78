//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that returns a label; the label is looked
//! up in the path map to get the next node id (or END). A label missing from the
//! map is a strategy bug and fails the run with `GraphError::UnknownRoute`.

use std::collections::HashMap;
use std::sync::Arc;

use super::GraphError;

/// Router function: takes a reference to state and returns a routing label.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Routing function plus its label → node id map.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: HashMap<String, String>,
}

impl<S> ConditionalRouter<S> {
    pub fn new(path: ConditionalRouterFn<S>, path_map: HashMap<String, String>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id from the current state.
    pub fn resolve_next(&self, source: &str, state: &S) -> Result<String, GraphError> {
        let label = (self.path)(state);
        self.path_map
            .get(&label)
            .cloned()
            .ok_or_else(|| GraphError::UnknownRoute {
                from: source.to_string(),
                label,
            })
    }

    pub(super) fn targets(&self) -> impl Iterator<Item = &String> {
        self.path_map.values()
    }
}

/// Builds a path map from `(label, node id)` pairs.
pub fn path_map<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
