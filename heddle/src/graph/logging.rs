//! Structured tracing helpers for graph execution.

/// Log node execution start.
pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id = node_id, step, "Starting node execution");
}

/// Log node execution completion with the trace description of its update.
pub fn log_node_complete(node_id: &str, description: &str) {
    tracing::debug!(node_id = node_id, description, "Node execution complete");
}

/// Log the routing decision taken after a node.
pub fn log_route(from: &str, to: &str) {
    tracing::trace!(from, to, "Route resolved");
}

/// Log graph execution start.
pub fn log_graph_start(step_budget: usize) {
    tracing::debug!(step_budget, "Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(steps: usize) {
    tracing::debug!(steps, "Graph execution complete");
}

/// Log that the step budget ran out before END.
pub fn log_budget_exhausted(node_id: &str, steps: usize) {
    tracing::warn!(next_node = node_id, steps, "Step budget exhausted, stopping run");
}

/// Log graph execution error.
pub fn log_graph_error(error: &super::GraphError) {
    tracing::error!(%error, "Graph execution error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_functions() {
        log_node_start("test_node", 0);
        log_node_complete("test_node", "+1 message(s)");
        log_route("a", "b");
        log_graph_start(4);
        log_graph_complete(2);
        log_budget_exhausted("a", 4);
        log_graph_error(&super::super::GraphError::MissingStart);
    }
}
