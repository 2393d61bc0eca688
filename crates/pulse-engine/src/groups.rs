//! Node groups
//!
//! A group is a titled set of nodes drawn together in the editor. Groups are
//! visual only: they have no ports and execution never looks at them.
//! Membership is kept in insertion order and a node may belong to several
//! groups.

use crate::connection::Connection;
use crate::node::GraphNode;
use crate::types::{GroupId, NodeId};

/// Approximate node footprint used for group bounds
const NODE_WIDTH: f64 = 200.0;
const NODE_HEIGHT: f64 = 100.0;

/// A titled set of nodes
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    pub id: GroupId,
    pub title: String,
    nodes: Vec<NodeId>,
}

impl NodeGroup {
    /// Create an empty group
    pub fn new(id: GroupId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            nodes: Vec::new(),
        }
    }

    /// Member node ids, in insertion order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Check if this group contains a specific node
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Add a member. Returns false if it was already present.
    pub(crate) fn insert(&mut self, node_id: NodeId) -> bool {
        if self.contains_node(node_id) {
            return false;
        }
        self.nodes.push(node_id);
        true
    }

    /// Remove a member. Returns false if it was not present.
    pub(crate) fn remove(&mut self, node_id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|id| *id != node_id);
        self.nodes.len() != before
    }

    /// Connections with exactly one end inside the group
    pub fn boundary_connections<'a>(
        &'a self,
        connections: &'a [Connection],
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        connections.iter().filter(move |c| {
            self.contains_node(c.source.node) != self.contains_node(c.target.node)
        })
    }

    /// Bounding box of the member nodes as (min_x, min_y, max_x, max_y)
    pub fn bounding_box<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a GraphNode>,
    ) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for node in nodes.into_iter().filter(|n| self.contains_node(n.id)) {
            let (x, y) = node.position;
            bounds = Some(match bounds {
                None => (x, y, x + NODE_WIDTH, y + NODE_HEIGHT),
                Some((min_x, min_y, max_x, max_y)) => (
                    min_x.min(x),
                    min_y.min(y),
                    max_x.max(x + NODE_WIDTH),
                    max_y.max(y + NODE_HEIGHT),
                ),
            });
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::PortRef;

    #[test]
    fn test_membership_is_unique() {
        let mut group = NodeGroup::new(uuid::Uuid::new_v4(), "Lights");
        let a = uuid::Uuid::new_v4();
        assert!(group.insert(a));
        assert!(!group.insert(a));
        assert_eq!(group.nodes(), &[a]);
        assert!(group.remove(a));
        assert!(!group.remove(a));
    }

    #[test]
    fn test_boundary_connections() {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let c = uuid::Uuid::new_v4();
        let mut group = NodeGroup::new(uuid::Uuid::new_v4(), "Inner");
        group.insert(a);
        group.insert(b);

        let connections = vec![
            Connection::flow(PortRef::new(a, 0), PortRef::new(b, 0)),
            Connection::flow(PortRef::new(b, 0), PortRef::new(c, 0)),
        ];
        let boundary: Vec<_> = group.boundary_connections(&connections).collect();
        assert_eq!(boundary.len(), 1);
        assert_eq!(boundary[0].target.node, c);
    }
}
