//! Fluent builder for graphs
//!
//! Builds a graph from string aliases and port names instead of ids and slot
//! indices, which keeps hand-written graphs in tests and host code readable.

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::PortRef;
use crate::error::{EngineError, Result};
use crate::graph::{Graph, NodeConfig};
use crate::registry::NodeRegistry;
use crate::types::{DataType, NodeId, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Flow,
    Value,
}

struct Link {
    kind: LinkKind,
    from: String,
    output: String,
    to: String,
    input: String,
}

struct PendingVariable {
    name: String,
    data_type: DataType,
    persistent: bool,
    value: Option<Value>,
}

/// Fluent builder for node graphs
///
/// # Example
///
/// ```ignore
/// let built = GraphBuilder::new(registry)
///     .add_node("count", "Constant<Int>")
///     .with_property("Value", 5)
///     .add_node("repeat", "Repeat")
///     .add_node("print", "Print")
///     .value("count", "Value", "repeat", "Count")
///     .flow("repeat", "Iteration", "print", "In")
///     .value("repeat", "Index", "print", "Value")
///     .build()?;
/// Pulse::new(&built.graph).run(built.id("repeat").unwrap(), 0).await?;
/// ```
pub struct GraphBuilder {
    registry: Arc<NodeRegistry>,
    name: String,
    nodes: Vec<(String, NodeConfig)>,
    links: Vec<Link>,
    variables: Vec<PendingVariable>,
}

impl GraphBuilder {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            name: String::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a node under an alias
    pub fn add_node(mut self, alias: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.nodes.push((alias.into(), NodeConfig::new(type_name)));
        self
    }

    /// Position the most recently added node
    pub fn at(self, x: f64, y: f64) -> Self {
        self.map_last(|config| config.with_position(x, y))
    }

    /// Set a property on the most recently added node
    pub fn with_property(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        self.map_last(|config| config.with_property(name, value))
    }

    /// Set the value input count of the most recently added node
    pub fn with_value_input_size(self, size: usize) -> Self {
        self.map_last(|config| config.with_value_input_size(size))
    }

    /// Set the value output count of the most recently added node
    pub fn with_value_output_size(self, size: usize) -> Self {
        self.map_last(|config| config.with_value_output_size(size))
    }

    /// Connect a flow output to a flow input by port name
    pub fn flow(
        mut self,
        from: impl Into<String>,
        output: impl Into<String>,
        to: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        self.links.push(Link {
            kind: LinkKind::Flow,
            from: from.into(),
            output: output.into(),
            to: to.into(),
            input: input.into(),
        });
        self
    }

    /// Connect a value output to a value input by port name
    pub fn value(
        mut self,
        from: impl Into<String>,
        output: impl Into<String>,
        to: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        self.links.push(Link {
            kind: LinkKind::Value,
            from: from.into(),
            output: output.into(),
            to: to.into(),
            input: input.into(),
        });
        self
    }

    /// Declare a graph variable
    pub fn variable(mut self, name: impl Into<String>, data_type: DataType, persistent: bool) -> Self {
        self.variables.push(PendingVariable {
            name: name.into(),
            data_type,
            persistent,
            value: None,
        });
        self
    }

    /// Set the initial value of the most recently declared variable
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        if let Some(variable) = self.variables.last_mut() {
            variable.value = Some(value.into());
        }
        self
    }

    /// Build the graph, failing on the first invalid node or connection
    pub fn build(self) -> Result<BuiltGraph> {
        let mut graph = Graph::new(self.registry);
        graph.set_name(self.name);

        let mut ids = HashMap::with_capacity(self.nodes.len());
        for (alias, config) in self.nodes {
            if ids.contains_key(&alias) {
                return Err(EngineError::failed(format!("duplicate node alias '{}'", alias)));
            }
            let id = graph.insert_node(config)?;
            ids.insert(alias, id);
        }

        for link in self.links {
            let from = lookup(&ids, &link.from)?;
            let to = lookup(&ids, &link.to)?;
            let (source, target) = resolve_ports(&graph, &link, from, to)?;
            match link.kind {
                LinkKind::Flow => graph.create_flow_connection(source, target)?,
                LinkKind::Value => graph.create_value_connection(source, target)?,
            }
        }

        for variable in self.variables {
            graph.add_variable(variable.name.as_str(), variable.data_type, variable.persistent)?;
            if let Some(value) = variable.value {
                graph.set_variable_value(&variable.name, value)?;
            }
        }

        Ok(BuiltGraph { graph, ids })
    }

    fn map_last(mut self, f: impl FnOnce(NodeConfig) -> NodeConfig) -> Self {
        if let Some((alias, config)) = self.nodes.pop() {
            self.nodes.push((alias, f(config)));
        }
        self
    }
}

fn lookup(ids: &HashMap<String, NodeId>, alias: &str) -> Result<NodeId> {
    ids.get(alias)
        .copied()
        .ok_or_else(|| EngineError::invalid_connection(format!("unknown node alias '{}'", alias)))
}

fn resolve_ports(graph: &Graph, link: &Link, from: NodeId, to: NodeId) -> Result<(PortRef, PortRef)> {
    let src = graph.node(from).ok_or(EngineError::UnknownNode(from))?;
    let dst = graph.node(to).ok_or(EngineError::UnknownNode(to))?;
    let (out_slot, in_slot) = match link.kind {
        LinkKind::Flow => (
            src.layout.flow_output_slot(&link.output),
            dst.layout.flow_input_slot(&link.input),
        ),
        LinkKind::Value => (
            src.layout.value_output_slot(&link.output),
            dst.layout.value_input_slot(&link.input),
        ),
    };
    let out_slot = out_slot.ok_or_else(|| {
        EngineError::invalid_connection(format!(
            "'{}' ({}) has no {:?} output '{}'",
            link.from, src.type_name, link.kind, link.output
        ))
    })?;
    let in_slot = in_slot.ok_or_else(|| {
        EngineError::invalid_connection(format!(
            "'{}' ({}) has no {:?} input '{}'",
            link.to, dst.type_name, link.kind, link.input
        ))
    })?;
    Ok((PortRef::new(from, out_slot), PortRef::new(to, in_slot)))
}

/// A built graph with its alias table
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: Graph,
    ids: HashMap<String, NodeId>,
}

impl BuiltGraph {
    /// Node id for an alias
    pub fn id(&self, alias: &str) -> Option<NodeId> {
        self.ids.get(alias).copied()
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_registry, Recorder};

    #[test]
    fn test_build_with_port_names() {
        let built = GraphBuilder::new(test_registry(Recorder::default()))
            .name("counting")
            .add_node("loop", "Loop")
            .add_node("ten", "Number")
            .with_property("Value", 10)
            .at(0.0, 120.0)
            .add_node("sum", "Sum")
            .add_node("record", "Record")
            .value("loop", "Index", "sum", "A")
            .value("ten", "Value", "sum", "B")
            .value("sum", "Sum", "record", "Value")
            .flow("loop", "Body", "record", "In")
            .variable("total", DataType::Int, true)
            .initial(3)
            .build()
            .unwrap();

        let graph = &built.graph;
        assert_eq!(graph.name(), "counting");
        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.connections().len(), 4);

        let sum = built.id("sum").unwrap();
        let ten = built.id("ten").unwrap();
        assert_eq!(
            graph.value_producer(PortRef::new(sum, 1)),
            Some(PortRef::new(ten, 0))
        );
        assert_eq!(graph.node(ten).unwrap().position, (0.0, 120.0));
        assert_eq!(graph.variable_value("total").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_unknown_port_and_alias() {
        let result = GraphBuilder::new(test_registry(Recorder::default()))
            .add_node("a", "Number")
            .add_node("b", "Record")
            .value("a", "Missing", "b", "Value")
            .build();
        assert!(matches!(result, Err(EngineError::InvalidConnection(_))));

        let result = GraphBuilder::new(test_registry(Recorder::default()))
            .add_node("a", "Number")
            .value("a", "Value", "ghost", "Value")
            .build();
        assert!(matches!(result, Err(EngineError::InvalidConnection(_))));
    }
}
