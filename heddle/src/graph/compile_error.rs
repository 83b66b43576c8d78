//! Graph construction and execution errors.
//!
//! Structural errors (duplicate node, missing node, no path to END) are raised while
//! a strategy builds its graph. `UnknownRoute` and `Node` surface from `invoke`.

use thiserror::Error;

use crate::error::AgentError;

#[derive(Debug, Error)]
pub enum GraphError {
    /// `add_node` was called twice with the same id.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// An edge or path map references an id that was never added (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge from START, or more than one.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// A node has two outgoing edges, or an edge and conditional edges.
    #[error("node has more than one outgoing transition: {0}")]
    AmbiguousTransition(String),

    /// A node reachable from START cannot reach END along any path.
    #[error("no path to END from node: {0}")]
    NoPathToEnd(String),

    /// A router returned a label missing from its path map.
    #[error("unknown route '{label}' from node '{from}'")]
    UnknownRoute { from: String, label: String },

    /// A node failed; the whole run fails with it.
    #[error("node '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: AgentError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of structural variants names the offending node.
    #[test]
    fn graph_error_display_names_node() {
        let s = GraphError::DuplicateNode("agent".into()).to_string();
        assert!(s.contains("duplicate") && s.contains("agent"), "{}", s);
        let s = GraphError::NoPathToEnd("loop".into()).to_string();
        assert!(s.contains("END") && s.contains("loop"), "{}", s);
        let s = GraphError::MissingStart.to_string();
        assert!(s.contains("START"), "{}", s);
    }

    /// **Scenario**: UnknownRoute shows both the source node and the label.
    #[test]
    fn graph_error_display_unknown_route() {
        let s = GraphError::UnknownRoute {
            from: "agent".into(),
            label: "bogus".into(),
        }
        .to_string();
        assert!(s.contains("agent") && s.contains("bogus"), "{}", s);
    }
}
