//! Node instances and the node execution contract
//!
//! A node's only execution entry point is [`Node::process`]. Instances are
//! built once per graph node by the registry's factory and shared by every
//! pulse, so they must not hold pulse-specific state; everything a run
//! produces goes through the [`NodeContext`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::pulse::NodeContext;
use crate::types::{DataType, NodeId, Value};

/// Execution contract for a node type
#[async_trait]
pub trait Node: Send + Sync {
    /// Read inputs, compute, write outputs and trigger flow outputs.
    ///
    /// `cx.triggered_by()` tells which flow input fired, or `None` when the
    /// node is evaluated because one of its value outputs was read.
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()>;
}

/// Everything a factory needs to build a node instance
pub struct NodeSetup<'a> {
    pub id: NodeId,
    /// Concrete generic arguments, in declaration order
    pub generics: &'a [DataType],
    pub layout: &'a NodeLayout,
}

/// Builds node instances for one registered type
pub trait NodeFactory: Send + Sync {
    fn create(&self, setup: &NodeSetup<'_>) -> Result<Arc<dyn Node>>;
}

impl<F> NodeFactory for F
where
    F: Fn(&NodeSetup<'_>) -> Result<Arc<dyn Node>> + Send + Sync,
{
    fn create(&self, setup: &NodeSetup<'_>) -> Result<Arc<dyn Node>> {
        self(setup)
    }
}

/// Factory that hands out one shared, stateless instance
pub struct SharedNodeFactory {
    node: Arc<dyn Node>,
}

impl SharedNodeFactory {
    pub fn new(node: impl Node + 'static) -> Self {
        Self {
            node: Arc::new(node),
        }
    }
}

impl NodeFactory for SharedNodeFactory {
    fn create(&self, _setup: &NodeSetup<'_>) -> Result<Arc<dyn Node>> {
        Ok(self.node.clone())
    }
}

/// A value port with its concrete type
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValuePort {
    pub id: String,
    pub data_type: DataType,
    pub required: bool,
    /// Used when the input is unconnected
    pub default_value: Value,
}

/// A property with its concrete type
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    pub id: String,
    pub data_type: DataType,
    pub default_value: Value,
}

/// The concrete ports and properties of one node instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLayout {
    pub value_inputs: Vec<ResolvedValuePort>,
    pub value_outputs: Vec<ResolvedValuePort>,
    pub flow_inputs: Vec<String>,
    pub flow_outputs: Vec<String>,
    pub properties: Vec<ResolvedProperty>,
}

impl NodeLayout {
    /// Whether the node takes part in control flow
    pub fn is_flow_node(&self) -> bool {
        !self.flow_inputs.is_empty() || !self.flow_outputs.is_empty()
    }

    /// Find a property by id
    pub fn property(&self, id: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Slot index of a value input by id
    pub fn value_input_slot(&self, id: &str) -> Option<usize> {
        self.value_inputs.iter().position(|p| p.id == id)
    }

    /// Slot index of a value output by id
    pub fn value_output_slot(&self, id: &str) -> Option<usize> {
        self.value_outputs.iter().position(|p| p.id == id)
    }

    /// Slot index of a flow input by id
    pub fn flow_input_slot(&self, id: &str) -> Option<usize> {
        self.flow_inputs.iter().position(|p| p == id)
    }

    /// Slot index of a flow output by id
    pub fn flow_output_slot(&self, id: &str) -> Option<usize> {
        self.flow_outputs.iter().position(|p| p == id)
    }
}

/// A node instance in a graph
#[derive(Clone)]
pub struct GraphNode {
    /// Unique identifier, stable across save/load
    pub id: NodeId,
    /// Canonical type descriptor (e.g., "Constant<Int>")
    pub type_name: String,
    /// Base type name (e.g., "Constant")
    pub node_type: String,
    /// Concrete generic arguments
    pub generics: Vec<DataType>,
    /// Position in the editor (x, y)
    pub position: (f64, f64),
    /// Property values, always of the declared property type
    pub properties: BTreeMap<String, Value>,
    /// Configured value input count, for variadic nodes
    pub value_input_size: Option<usize>,
    /// Configured value output count, for variadic nodes
    pub value_output_size: Option<usize>,
    /// Resolved ports and properties
    pub layout: NodeLayout,
    pub(crate) logic: Arc<dyn Node>,
}

impl GraphNode {
    /// Current value of a property, falling back to its default
    pub fn property(&self, id: &str) -> Option<&Value> {
        self.properties
            .get(id)
            .or_else(|| self.layout.property(id).map(|p| &p.default_value))
    }

    /// Whether the node takes part in control flow
    pub fn is_flow_node(&self) -> bool {
        self.layout.is_flow_node()
    }

    pub(crate) fn logic(&self) -> &Arc<dyn Node> {
        &self.logic
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("position", &self.position)
            .field("properties", &self.properties)
            .field("value_input_size", &self.value_input_size)
            .field("value_output_size", &self.value_output_size)
            .finish_non_exhaustive()
    }
}
