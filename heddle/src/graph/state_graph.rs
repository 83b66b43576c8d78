//! State graph builder: nodes, explicit edges and conditional edges.
//!
//! Add nodes with `add_node`, chain them with `add_edge(from, to)` using `START`
//! and `END`, and branch with `add_conditional_edges`. A node has exactly one
//! outgoing transition: an edge or a router. `compile` validates the structure.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::compiled::{CompiledStateGraph, NextEntry};
use super::conditional::{ConditionalRouter, ConditionalRouterFn};
use super::{GraphError, GraphState, Node};

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
/// Strategies build one per configuration and reuse it across runs.
pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
        }
    }

    /// Adds a node. Fails with `DuplicateNode` if the id is taken or reserved.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        node: Arc<dyn Node<S>>,
    ) -> Result<&mut Self, GraphError> {
        let id = id.into();
        if id == START || id == END || self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(self)
    }

    /// Adds an unconditional edge. Ids are checked at `compile()`.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// After `source` runs, `path(state)` returns a label and `path_map[label]`
    /// is the next node (or END).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "agent",
    ///     Arc::new(|s: &ConversationState| {
    ///         if s.pending_tool_calls().is_empty() {
    ///             "end".to_string()
    ///         } else {
    ///             "tools".to_string()
    ///         }
    ///     }),
    ///     path_map([("tools", "tools"), ("end", END)]),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: HashMap<String, String>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph.
    ///
    /// Checks that every referenced id exists, that START has exactly one edge,
    /// that every node has at most one outgoing transition, and that every node
    /// reachable from START can reach END along at least one path. Loops are allowed.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, GraphError> {
        let known = |id: &str| id == END || self.nodes.contains_key(id);

        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::NodeNotFound(from.clone()));
            }
            if !known(to) {
                return Err(GraphError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(GraphError::NodeNotFound(source.clone()));
            }
            if let Some(target) = router.targets().find(|t| !known(t)) {
                return Err(GraphError::NodeNotFound(target.clone()));
            }
        }

        let mut start_edges = self.edges.iter().filter(|(f, _)| f == START);
        let first = match (start_edges.next(), start_edges.next()) {
            (Some((_, to)), None) => to.clone(),
            _ => return Err(GraphError::MissingStart),
        };

        let mut next_map: HashMap<String, NextEntry<S>> = HashMap::new();
        for (from, to) in self.edges.iter().filter(|(f, _)| f != START) {
            if next_map
                .insert(from.clone(), NextEntry::Unconditional(to.clone()))
                .is_some()
            {
                return Err(GraphError::AmbiguousTransition(from.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if next_map
                .insert(source.clone(), NextEntry::Conditional(router.clone()))
                .is_some()
            {
                return Err(GraphError::AmbiguousTransition(source.clone()));
            }
        }

        check_end_reachable(&first, &next_map)?;

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
        })
    }
}

/// Every node reachable from `first` must have some path to END.
fn check_end_reachable<S>(
    first: &str,
    next_map: &HashMap<String, NextEntry<S>>,
) -> Result<(), GraphError> {
    let successors = |id: &str| -> Vec<String> {
        match next_map.get(id) {
            Some(NextEntry::Unconditional(to)) => vec![to.clone()],
            Some(NextEntry::Conditional(router)) => router.targets().cloned().collect(),
            None => Vec::new(),
        }
    };

    let mut reachable: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue = VecDeque::from([first.to_string()]);
    let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(id) = queue.pop_front() {
        if id == END || !seen.insert(id.clone()) {
            continue;
        }
        for next in successors(&id) {
            predecessors.entry(next.clone()).or_default().push(id.clone());
            queue.push_back(next);
        }
        reachable.push(id);
    }

    let mut reaches_end: HashSet<String> = HashSet::new();
    let mut queue = VecDeque::from([END.to_string()]);
    while let Some(id) = queue.pop_front() {
        for pred in predecessors.get(&id).into_iter().flatten() {
            if reaches_end.insert(pred.clone()) {
                queue.push_back(pred.clone());
            }
        }
    }

    match reachable.into_iter().find(|id| !reaches_end.contains(id)) {
        Some(stuck) => Err(GraphError::NoPathToEnd(stuck)),
        None => Ok(()),
    }
}
