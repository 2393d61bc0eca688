//! Graph container
//!
//! The graph owns nodes, connections, groups and variables, and is mutated
//! only through its API. Every structural mutation resets the derived
//! [`GraphIndex`], which is rebuilt on the next query.
//!
//! Structural invariants maintained here:
//! - every connection references existing nodes and valid slots
//! - value connections join convertible types and never form a cycle
//! - a value input has at most one producer; connecting a new producer
//!   replaces the old connection
//! - identical flow connections are stored once

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use crate::connection::{Connection, ConnectionKind, PortRef};
use crate::error::{EngineError, Result};
use crate::groups::NodeGroup;
use crate::node::GraphNode;
use crate::registry::NodeRegistry;
use crate::resolver::TypeResolver;
use crate::types::{DataType, GroupId, NodeId, Value, VariableId};
use crate::variables::{GraphVariable, VariableStore};

/// Everything needed to place a node in one call
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Fixed id; a v4 UUID is generated when absent
    pub id: Option<NodeId>,
    /// Type descriptor, e.g. `Constant<Int>`
    pub type_name: String,
    pub position: (f64, f64),
    /// Property values, coerced to the declared property types
    pub properties: BTreeMap<String, Value>,
    pub value_input_size: Option<usize>,
    pub value_output_size: Option<usize>,
}

impl NodeConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_value_input_size(mut self, size: usize) -> Self {
        self.value_input_size = Some(size);
        self
    }

    pub fn with_value_output_size(mut self, size: usize) -> Self {
        self.value_output_size = Some(size);
        self
    }
}

/// Lookup tables derived from the node and connection lists
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    positions: HashMap<NodeId, usize>,
    /// Value input -> producing output
    value_producers: HashMap<PortRef, PortRef>,
    /// Flow output -> connected flow inputs, in connection order
    flow_targets: HashMap<PortRef, Vec<PortRef>>,
    /// Producer node -> nodes reading its value outputs
    value_consumers: HashMap<NodeId, Vec<NodeId>>,
}

impl GraphIndex {
    fn build(nodes: &[GraphNode], connections: &[Connection]) -> Self {
        let mut index = Self {
            positions: nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect(),
            ..Self::default()
        };

        for connection in connections {
            match connection.kind {
                ConnectionKind::Value => {
                    index
                        .value_producers
                        .insert(connection.target, connection.source);
                    let consumers = index
                        .value_consumers
                        .entry(connection.source.node)
                        .or_default();
                    if !consumers.contains(&connection.target.node) {
                        consumers.push(connection.target.node);
                    }
                }
                ConnectionKind::Flow => {
                    index
                        .flow_targets
                        .entry(connection.source)
                        .or_default()
                        .push(connection.target);
                }
            }
        }
        index
    }
}

/// A node graph
#[derive(Clone)]
pub struct Graph {
    id: uuid::Uuid,
    name: String,
    registry: Arc<NodeRegistry>,
    nodes: Vec<GraphNode>,
    connections: Vec<Connection>,
    groups: Vec<NodeGroup>,
    variables: VariableStore,
    index: OnceLock<GraphIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .field("groups", &self.groups)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Create an empty graph
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_id(uuid::Uuid::new_v4(), "", registry)
    }

    /// Create an empty graph with a known id and name
    pub fn with_id(id: uuid::Uuid, name: impl Into<String>, registry: Arc<NodeRegistry>) -> Self {
        Self {
            id,
            name: name.into(),
            registry,
            nodes: Vec::new(),
            connections: Vec::new(),
            groups: Vec::new(),
            variables: VariableStore::new(),
            index: OnceLock::new(),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(&self.registry)
    }

    // --- Queries ---

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Find a node by id
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.index()
            .positions
            .get(&id)
            .and_then(|&i| self.nodes.get(i))
    }

    /// Check if a node exists
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index().positions.contains_key(&id)
    }

    /// The output feeding a value input, if connected
    pub fn value_producer(&self, input: PortRef) -> Option<PortRef> {
        self.index().value_producers.get(&input).copied()
    }

    /// Flow inputs connected to a flow output, in connection order
    pub fn flow_targets(&self, output: PortRef) -> &[PortRef] {
        self.index()
            .flow_targets
            .get(&output)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes reading any value output of `node`
    pub fn value_consumers(&self, node: NodeId) -> &[NodeId] {
        self.index()
            .value_consumers
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn index(&self) -> &GraphIndex {
        self.index
            .get_or_init(|| GraphIndex::build(&self.nodes, &self.connections))
    }

    fn invalidate(&mut self) {
        self.index = OnceLock::new();
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut GraphNode> {
        let position = *self
            .index()
            .positions
            .get(&id)
            .ok_or(EngineError::UnknownNode(id))?;
        Ok(&mut self.nodes[position])
    }

    fn require_node(&self, id: NodeId) -> Result<&GraphNode> {
        self.node(id).ok_or(EngineError::UnknownNode(id))
    }

    // --- Nodes ---

    /// Add a node of the given type. Generates an id when `id` is `None`.
    pub fn add_node(&mut self, id: Option<NodeId>, type_name: &str) -> Result<NodeId> {
        self.insert_node(NodeConfig {
            id,
            type_name: type_name.to_string(),
            ..NodeConfig::default()
        })
    }

    /// Add a node with position, properties and variable-arity sizes
    pub fn insert_node(&mut self, config: NodeConfig) -> Result<NodeId> {
        let id = config.id.unwrap_or_else(uuid::Uuid::new_v4);
        if self.contains_node(id) {
            return Err(EngineError::DuplicateNode(id));
        }

        let resolver = TypeResolver::new(&self.registry);
        let resolved = resolver.resolve_node_type(&config.type_name)?;
        let layout = resolved.layout(config.value_input_size, config.value_output_size)?;
        let logic = resolved.create_node(id, &layout)?;

        let meta = resolved.metadata();
        let value_input_size = meta
            .has_variadic_inputs()
            .then_some(layout.value_inputs.len());
        let value_output_size = meta
            .has_variadic_outputs()
            .then_some(layout.value_outputs.len());

        let mut properties: BTreeMap<String, Value> = layout
            .properties
            .iter()
            .map(|p| (p.id.clone(), p.default_value.clone()))
            .collect();
        for (name, value) in config.properties {
            let property = layout.property(&name).ok_or_else(|| EngineError::InvalidProperty {
                node_id: id,
                name: name.clone(),
                reason: "no such property".to_string(),
            })?;
            let value = value
                .convert(&property.data_type)
                .map_err(|e| EngineError::InvalidProperty {
                    node_id: id,
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            properties.insert(name, value);
        }

        let node = GraphNode {
            id,
            type_name: resolved.canonical(),
            node_type: resolved.node_type().to_string(),
            generics: resolved.into_generics(),
            position: config.position,
            properties,
            value_input_size,
            value_output_size,
            layout,
            logic,
        };
        log::debug!("Added node {} ({})", id, node.type_name);

        self.nodes.push(node);
        self.invalidate();
        Ok(id)
    }

    /// Remove a node with its connections and group memberships
    pub fn remove_node(&mut self, id: NodeId) -> Result<GraphNode> {
        let position = *self
            .index()
            .positions
            .get(&id)
            .ok_or(EngineError::UnknownNode(id))?;
        let node = self.nodes.remove(position);
        self.connections.retain(|c| !c.touches(id));
        for group in &mut self.groups {
            group.remove(id);
        }
        self.invalidate();
        log::debug!("Removed node {} ({})", id, node.type_name);
        Ok(node)
    }

    /// Move a node in the editor
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        self.node_mut(id)?.position = (x, y);
        Ok(())
    }

    /// Set a property, coercing the value to the declared property type
    pub fn set_property(&mut self, id: NodeId, name: &str, value: impl Into<Value>) -> Result<()> {
        let node = self.node_mut(id)?;
        let property = node
            .layout
            .property(name)
            .ok_or_else(|| EngineError::InvalidProperty {
                node_id: id,
                name: name.to_string(),
                reason: "no such property".to_string(),
            })?;
        let value = value
            .into()
            .convert(&property.data_type)
            .map_err(|e| EngineError::InvalidProperty {
                node_id: id,
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        node.properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Change the value input count of a variadic node.
    ///
    /// Connections to input slots that no longer exist are removed.
    pub fn set_value_input_size(&mut self, id: NodeId, size: usize) -> Result<()> {
        self.resize(id, Some(size), None)
    }

    /// Change the value output count of a variadic node.
    ///
    /// Connections from output slots that no longer exist are removed.
    pub fn set_value_output_size(&mut self, id: NodeId, size: usize) -> Result<()> {
        self.resize(id, None, Some(size))
    }

    fn resize(&mut self, id: NodeId, inputs: Option<usize>, outputs: Option<usize>) -> Result<()> {
        let node = self.require_node(id)?;
        let (input_size, output_size) = match (inputs, outputs) {
            (Some(_), _) if node.value_input_size.is_none() => {
                return Err(EngineError::InvalidProperty {
                    node_id: id,
                    name: "value_input_size".to_string(),
                    reason: "node has no variable-arity inputs".to_string(),
                })
            }
            (_, Some(_)) if node.value_output_size.is_none() => {
                return Err(EngineError::InvalidProperty {
                    node_id: id,
                    name: "value_output_size".to_string(),
                    reason: "node has no variable-arity outputs".to_string(),
                })
            }
            _ => (
                inputs.or(node.value_input_size),
                outputs.or(node.value_output_size),
            ),
        };

        let resolver = TypeResolver::new(&self.registry);
        let resolved = resolver.resolve_node_type(&node.type_name)?;
        let layout = resolved.layout(input_size, output_size)?;
        let logic = resolved.create_node(id, &layout)?;

        let input_count = layout.value_inputs.len();
        let output_count = layout.value_outputs.len();
        let before = self.connections.len();
        self.connections.retain(|c| {
            c.kind != ConnectionKind::Value
                || ((c.target.node != id || c.target.slot < input_count)
                    && (c.source.node != id || c.source.slot < output_count))
        });
        let dropped = before - self.connections.len();
        if dropped > 0 {
            log::debug!("Resizing node {} dropped {} connection(s)", id, dropped);
        }

        let node = self.node_mut(id)?;
        node.value_input_size = node.value_input_size.map(|_| input_count);
        node.value_output_size = node.value_output_size.map(|_| output_count);
        node.layout = layout;
        node.logic = logic;
        self.invalidate();
        Ok(())
    }

    // --- Connections ---

    /// Connect a value output to a value input.
    ///
    /// Fails with `InvalidConnection` for unknown nodes, bad slots or
    /// incompatible types, and with `CycleDetected` when the connection would
    /// close a value cycle. The graph is unchanged on failure.
    pub fn create_value_connection(&mut self, source: PortRef, target: PortRef) -> Result<()> {
        let src = self
            .node(source.node)
            .ok_or_else(|| EngineError::invalid_connection(format!("unknown source node {}", source.node)))?;
        let dst = self
            .node(target.node)
            .ok_or_else(|| EngineError::invalid_connection(format!("unknown target node {}", target.node)))?;

        let out_port = src.layout.value_outputs.get(source.slot).ok_or_else(|| {
            EngineError::invalid_connection(format!(
                "{} has no value output slot {}",
                src.type_name, source.slot
            ))
        })?;
        let in_port = dst.layout.value_inputs.get(target.slot).ok_or_else(|| {
            EngineError::invalid_connection(format!(
                "{} has no value input slot {}",
                dst.type_name, target.slot
            ))
        })?;
        if !out_port.data_type.can_convert_to(&in_port.data_type) {
            return Err(EngineError::invalid_connection(format!(
                "{}.{} ({}) cannot feed {}.{} ({})",
                src.type_name,
                out_port.id,
                out_port.data_type,
                dst.type_name,
                in_port.id,
                in_port.data_type
            )));
        }

        if self.value_producer(target) == Some(source) {
            return Ok(());
        }
        if self.reaches(target.node, source.node) {
            return Err(EngineError::CycleDetected {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        self.connections
            .retain(|c| !(c.kind == ConnectionKind::Value && c.target == target));
        self.connections.push(Connection::value(source, target));
        self.invalidate();
        Ok(())
    }

    /// Connect a flow output to a flow input. Flow cycles are allowed.
    pub fn create_flow_connection(&mut self, source: PortRef, target: PortRef) -> Result<()> {
        let src = self
            .node(source.node)
            .ok_or_else(|| EngineError::invalid_connection(format!("unknown source node {}", source.node)))?;
        let dst = self
            .node(target.node)
            .ok_or_else(|| EngineError::invalid_connection(format!("unknown target node {}", target.node)))?;

        if source.slot >= src.layout.flow_outputs.len() {
            return Err(EngineError::invalid_connection(format!(
                "{} has no flow output slot {}",
                src.type_name, source.slot
            )));
        }
        if target.slot >= dst.layout.flow_inputs.len() {
            return Err(EngineError::invalid_connection(format!(
                "{} has no flow input slot {}",
                dst.type_name, target.slot
            )));
        }

        let connection = Connection::flow(source, target);
        if self.connections.contains(&connection) {
            return Ok(());
        }
        self.connections.push(connection);
        self.invalidate();
        Ok(())
    }

    /// Remove a connection. Returns false if it did not exist.
    pub fn remove_connection(&mut self, connection: &Connection) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c != connection);
        let removed = self.connections.len() != before;
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Whether `to` is reachable from `from` along value connections
    /// (producer to consumer). A node reaches itself.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.insert(node) {
                stack.extend(self.value_consumers(node).iter().copied());
            }
        }
        false
    }

    // --- Groups ---

    /// Create an empty group
    pub fn add_group(&mut self, title: impl Into<String>) -> GroupId {
        let id = uuid::Uuid::new_v4();
        self.groups.push(NodeGroup::new(id, title));
        id
    }

    /// Insert a prepared group as is
    pub(crate) fn insert_group(&mut self, group: NodeGroup) {
        self.groups.push(group);
    }

    pub fn remove_group(&mut self, id: GroupId) -> Result<NodeGroup> {
        let position = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(EngineError::UnknownGroup(id))?;
        Ok(self.groups.remove(position))
    }

    pub fn rename_group(&mut self, id: GroupId, title: impl Into<String>) -> Result<()> {
        self.group_mut(id)?.title = title.into();
        Ok(())
    }

    /// Add a node to a group. Returns false if it was already a member.
    pub fn add_to_group(&mut self, group: GroupId, node: NodeId) -> Result<bool> {
        self.require_node(node)?;
        Ok(self.group_mut(group)?.insert(node))
    }

    /// Remove a node from a group. Returns false if it was not a member.
    pub fn remove_from_group(&mut self, group: GroupId, node: NodeId) -> Result<bool> {
        Ok(self.group_mut(group)?.remove(node))
    }

    pub fn group(&self, id: GroupId) -> Option<&NodeGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    /// Editor bounds of a group's members
    pub fn group_bounds(&self, id: GroupId) -> Result<Option<(f64, f64, f64, f64)>> {
        let group = self.group(id).ok_or(EngineError::UnknownGroup(id))?;
        Ok(group.bounding_box(&self.nodes))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut NodeGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(EngineError::UnknownGroup(id))
    }

    // --- Variables ---

    /// Declare a variable holding its type default
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        data_type: DataType,
        persistent: bool,
    ) -> Result<VariableId> {
        let variable = GraphVariable::new(uuid::Uuid::new_v4(), name, data_type, persistent);
        let id = variable.id;
        self.variables.insert(variable)?;
        Ok(id)
    }

    /// Insert a prepared variable (id and value included)
    pub fn insert_variable(&mut self, variable: GraphVariable) -> Result<()> {
        self.variables.insert(variable)
    }

    pub fn remove_variable(&mut self, id: VariableId) -> Result<GraphVariable> {
        self.variables
            .remove(id)
            .ok_or_else(|| EngineError::UnknownVariable(id.to_string()))
    }

    pub fn variable(&self, id: VariableId) -> Option<GraphVariable> {
        self.variables.get(id)
    }

    pub fn variable_by_name(&self, name: &str) -> Option<GraphVariable> {
        self.variables.by_name(name)
    }

    /// Write a variable. Visible to running pulses immediately.
    pub fn set_variable_value(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.variables.set(name, value.into())
    }

    pub fn variable_value(&self, name: &str) -> Result<Value> {
        self.variables.value(name)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }
}
