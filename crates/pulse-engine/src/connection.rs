//! Connections between node ports

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Which port kind a connection joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Control: triggering the source output runs the destination node
    Flow,
    /// Data: the destination input reads the source output
    Value,
}

/// One end of a connection: a node and a slot index on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: NodeId,
    pub slot: usize,
}

impl PortRef {
    pub fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.node, self.slot)
    }
}

/// A directed edge from an output slot to an input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub kind: ConnectionKind,
    /// Output side
    pub source: PortRef,
    /// Input side
    pub target: PortRef,
}

impl Connection {
    pub fn flow(source: PortRef, target: PortRef) -> Self {
        Self {
            kind: ConnectionKind::Flow,
            source,
            target,
        }
    }

    pub fn value(source: PortRef, target: PortRef) -> Self {
        Self {
            kind: ConnectionKind::Value,
            source,
            target,
        }
    }

    /// Whether either end is on `node`
    pub fn touches(&self, node: NodeId) -> bool {
        self.source.node == node || self.target.node == node
    }
}
