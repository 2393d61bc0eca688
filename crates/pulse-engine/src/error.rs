//! Error types for the pulse engine

use thiserror::Error;

use crate::types::DataType;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building, loading or running a graph
#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown base type name or malformed descriptor text
    #[error("Cannot resolve type '{descriptor}': {reason}")]
    TypeResolution { descriptor: String, reason: String },

    /// Descriptor argument count does not match the declared parameters
    #[error("Type '{name}' expects {expected} generic argument(s), got {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Type mismatch, dangling endpoint or bad slot on a connection
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A value connection would close a cycle
    #[error("Connecting {from} -> {to} would create a value cycle")]
    CycleDetected { from: String, to: String },

    /// Runtime cycle guard tripped during value evaluation
    #[error("Graph execution error at node {node_id}: {message}")]
    GraphExecution { node_id: uuid::Uuid, message: String },

    /// Error raised by a node's own logic
    #[error("Node {node_id} ({node_type}) failed: {source}")]
    NodeProcess {
        node_id: uuid::Uuid,
        node_type: String,
        #[source]
        source: Box<EngineError>,
    },

    /// Node ID not present in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(uuid::Uuid),

    /// Node ID already present in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNode(uuid::Uuid),

    /// Group ID not present in the graph
    #[error("Unknown group: {0}")]
    UnknownGroup(uuid::Uuid),

    /// Variable not present in the graph
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Variable name already taken
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),

    /// Property missing from the node type or given an incompatible value
    #[error("Invalid property '{name}' on node {node_id}: {reason}")]
    InvalidProperty {
        node_id: uuid::Uuid,
        name: String,
        reason: String,
    },

    /// A value could not be converted to the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: DataType, found: String },

    /// Nested flow triggers exceeded the configured depth
    #[error("Flow depth limit of {limit} exceeded at node {node_id}")]
    FlowDepthExceeded { node_id: uuid::Uuid, limit: usize },

    /// Failure reported by node logic
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl EngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a type resolution error
    pub fn unresolved(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeResolution {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid connection error
    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        Self::InvalidConnection(msg.into())
    }

    /// Wrap an error raised inside a node's logic.
    ///
    /// Errors that already carry node context pass through unchanged so the
    /// innermost failing node is the one reported.
    pub fn in_node(self, node_id: uuid::Uuid, node_type: &str) -> Self {
        match self {
            Self::NodeProcess { .. }
            | Self::GraphExecution { .. }
            | Self::FlowDepthExceeded { .. } => self,
            other => Self::NodeProcess {
                node_id,
                node_type: node_type.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The node an execution error is attributed to, if any
    pub fn node_id(&self) -> Option<uuid::Uuid> {
        match self {
            Self::NodeProcess { node_id, .. }
            | Self::GraphExecution { node_id, .. }
            | Self::FlowDepthExceeded { node_id, .. } => Some(*node_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_node_wraps_once() {
        let id = uuid::Uuid::new_v4();
        let outer = uuid::Uuid::new_v4();
        let err = EngineError::failed("boom").in_node(id, "Print");
        let err = err.in_node(outer, "Repeat");

        assert_eq!(err.node_id(), Some(id));
        match err {
            EngineError::NodeProcess { node_type, source, .. } => {
                assert_eq!(node_type, "Print");
                assert!(matches!(*source, EngineError::ExecutionFailed(_)));
            }
            other => panic!("Expected NodeProcess, got {other:?}"),
        }
    }

    #[test]
    fn test_graph_execution_not_wrapped() {
        let id = uuid::Uuid::new_v4();
        let err = EngineError::GraphExecution {
            node_id: id,
            message: "cycle".to_string(),
        }
        .in_node(uuid::Uuid::new_v4(), "Add<Int>");
        assert!(matches!(err, EngineError::GraphExecution { .. }));
        assert_eq!(err.node_id(), Some(id));
    }
}
