//! Structural lint for graphs
//!
//! The graph API already rejects invalid connections, so everything reported
//! here is a graph that will run but probably not as intended: required
//! inputs left on their defaults, nodes nothing can reach, pure nodes whose
//! results are never read.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::connection::{ConnectionKind, PortRef};
use crate::graph::Graph;
use crate::types::NodeId;

/// A lint finding with location context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value connections form a cycle
    #[error("Value connections form a cycle through {} node(s)", .nodes.len())]
    ValueCycle { nodes: Vec<NodeId> },

    /// A required value input is not connected and will read its default
    #[error("Required input '{port_id}' on node {node_id} is not connected")]
    UnconnectedRequiredInput { node_id: NodeId, port_id: String },

    /// A node has no connections at all
    #[error("Node {node_id} has no connections")]
    OrphanedNode { node_id: NodeId },

    /// A pure node whose outputs nobody reads never runs
    #[error("Pure node {node_id} ({node_type}) has no consumers")]
    UnusedPureNode { node_id: NodeId, node_type: String },
}

/// Lint a graph, returning every finding (not just the first)
pub fn validate_graph(graph: &Graph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    detect_value_cycles(graph, &mut errors);
    validate_required_inputs(graph, &mut errors);
    detect_orphans(graph, &mut errors);
    detect_unused_pure_nodes(graph, &mut errors);

    errors
}

/// Topological order of the nodes along value connections (producers first).
///
/// Returns `None` if value connections form a cycle.
pub fn value_order(graph: &Graph) -> Option<Vec<NodeId>> {
    let (order, remaining) = sort_by_value_edges(graph);
    remaining.is_empty().then_some(order)
}

/// Kahn's algorithm over value connections. Returns the sorted nodes and the
/// nodes left over on a cycle.
fn sort_by_value_edges(graph: &Graph) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut in_degree: HashMap<NodeId, usize> = graph.nodes().iter().map(|n| (n.id, 0)).collect();
    let mut edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for connection in graph.connections() {
        if connection.kind != ConnectionKind::Value {
            continue;
        }
        *in_degree.entry(connection.target.node).or_insert(0) += 1;
        edges
            .entry(connection.source.node)
            .or_default()
            .push(connection.target.node);
    }

    // Seed in graph order so the result is deterministic
    let mut queue: VecDeque<NodeId> = graph
        .nodes()
        .iter()
        .map(|n| n.id)
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(graph.nodes().len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for target in edges.get(&node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(target) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*target);
                }
            }
        }
    }

    let remaining = graph
        .nodes()
        .iter()
        .map(|n| n.id)
        .filter(|id| in_degree.get(id).is_some_and(|d| *d > 0))
        .collect();
    (order, remaining)
}

fn detect_value_cycles(graph: &Graph, errors: &mut Vec<ValidationError>) {
    let (_, remaining) = sort_by_value_edges(graph);
    if !remaining.is_empty() {
        errors.push(ValidationError::ValueCycle { nodes: remaining });
    }
}

fn validate_required_inputs(graph: &Graph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        for (slot, port) in node.layout.value_inputs.iter().enumerate() {
            if port.required && graph.value_producer(PortRef::new(node.id, slot)).is_none() {
                errors.push(ValidationError::UnconnectedRequiredInput {
                    node_id: node.id,
                    port_id: port.id.clone(),
                });
            }
        }
    }
}

fn detect_orphans(graph: &Graph, errors: &mut Vec<ValidationError>) {
    // A lone graph is not an error
    if graph.nodes().len() < 2 {
        return;
    }
    for node in graph.nodes() {
        if !graph.connections().iter().any(|c| c.touches(node.id)) {
            errors.push(ValidationError::OrphanedNode { node_id: node.id });
        }
    }
}

fn detect_unused_pure_nodes(graph: &Graph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        let connected = graph.connections().iter().any(|c| c.touches(node.id));
        if !node.is_flow_node() && connected && graph.value_consumers(node.id).is_empty() {
            errors.push(ValidationError::UnusedPureNode {
                node_id: node.id,
                node_type: node.type_name.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_registry, Recorder};

    fn graph() -> Graph {
        Graph::new(test_registry(Recorder::default()))
    }

    #[test]
    fn test_clean_graph() {
        let mut graph = graph();
        let number = graph.add_node(None, "Number").unwrap();
        let record = graph.add_node(None, "Record").unwrap();
        graph
            .create_value_connection(PortRef::new(number, 0), PortRef::new(record, 0))
            .unwrap();

        assert!(validate_graph(&graph).is_empty());
        assert_eq!(value_order(&graph), Some(vec![number, record]));
    }

    #[test]
    fn test_orphans_and_unused_pure_nodes() {
        let mut graph = graph();
        let number = graph.add_node(None, "Number").unwrap();
        let sum = graph.add_node(None, "Sum").unwrap();
        let lonely = graph.add_node(None, "Record").unwrap();
        graph
            .create_value_connection(PortRef::new(number, 0), PortRef::new(sum, 0))
            .unwrap();

        let errors = validate_graph(&graph);
        assert_eq!(
            errors,
            vec![
                ValidationError::OrphanedNode { node_id: lonely },
                ValidationError::UnusedPureNode {
                    node_id: sum,
                    node_type: "Sum".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_value_order_puts_producers_first() {
        let mut graph = graph();
        let record = graph.add_node(None, "Record").unwrap();
        let sum = graph.add_node(None, "Sum").unwrap();
        let number = graph.add_node(None, "Number").unwrap();
        graph
            .create_value_connection(PortRef::new(sum, 0), PortRef::new(record, 0))
            .unwrap();
        graph
            .create_value_connection(PortRef::new(number, 0), PortRef::new(sum, 1))
            .unwrap();

        assert_eq!(value_order(&graph), Some(vec![number, sum, record]));
    }
}
