//! Persisted graph documents
//!
//! [`GraphDocument`] is the serde form of a graph. Saving is lossless for
//! everything that affects behavior; loading is tolerant and recovers per
//! entity: a node, connection, group member or variable that cannot be
//! restored is skipped with a [`LoadWarning`] and the rest of the document
//! still loads.
//!
//! Load order is nodes, connections, groups, then variables, so that later
//! entities can be checked against the ones already restored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionKind, PortRef};
use crate::error::Result;
use crate::graph::{Graph, NodeConfig};
use crate::groups::NodeGroup;
use crate::registry::NodeRegistry;
use crate::types::{NodeId, Value};
use crate::variables::GraphVariable;

/// Schema version written by [`save`]
pub const DOCUMENT_VERSION: u32 = 1;

/// A whole graph in persisted form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: u32,
    pub id: uuid::Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Canonical type descriptor
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_input_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_output_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub kind: ConnectionKind,
    pub out_id: NodeId,
    pub out_slot: usize,
    pub in_id: NodeId,
    pub in_slot: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: uuid::Uuid,
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub id: uuid::Uuid,
    pub name: String,
    pub persistent: bool,
    /// Value type descriptor
    #[serde(rename = "type")]
    pub data_type: String,
    /// Only written for persistent variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Which part of a document a warning is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadWarningKind {
    Version,
    Node,
    Connection,
    Group,
    Variable,
}

/// Something that was skipped while loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadWarning {
    pub kind: LoadWarningKind,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Result of a tolerant load
#[derive(Debug)]
pub struct LoadOutcome {
    pub graph: Graph,
    pub warnings: Vec<LoadWarning>,
}

/// Convert a graph to its persisted form
pub fn save(graph: &Graph) -> GraphDocument {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| NodeRecord {
            id: node.id,
            type_name: node.type_name.clone(),
            position: Position {
                x: node.position.0,
                y: node.position.1,
            },
            properties: node
                .properties
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
            value_input_size: node.value_input_size,
            value_output_size: node.value_output_size,
        })
        .collect();

    let connections = graph
        .connections()
        .iter()
        .map(|c| ConnectionRecord {
            kind: c.kind,
            out_id: c.source.node,
            out_slot: c.source.slot,
            in_id: c.target.node,
            in_slot: c.target.slot,
        })
        .collect();

    let groups = graph
        .groups()
        .iter()
        .map(|g| GroupRecord {
            id: g.id,
            title: g.title.clone(),
            nodes: g.nodes().to_vec(),
        })
        .collect();

    let variables = graph
        .variables()
        .all()
        .into_iter()
        .map(|v| VariableRecord {
            id: v.id,
            name: v.name,
            persistent: v.persistent,
            data_type: v.data_type.to_string(),
            value: v.persistent.then(|| v.value.to_json()),
        })
        .collect();

    GraphDocument {
        version: DOCUMENT_VERSION,
        id: graph.id(),
        name: graph.name().to_string(),
        nodes,
        connections,
        groups,
        variables,
    }
}

/// Rebuild a graph from a document, skipping what cannot be restored
pub fn load(doc: &GraphDocument, registry: Arc<NodeRegistry>) -> LoadOutcome {
    let mut loader = Loader {
        graph: Graph::with_id(doc.id, doc.name.clone(), registry),
        warnings: Vec::new(),
    };

    if doc.version > DOCUMENT_VERSION {
        loader.warn(
            LoadWarningKind::Version,
            format!(
                "document version {} is newer than {}; loading best-effort",
                doc.version, DOCUMENT_VERSION
            ),
        );
    }

    for record in &doc.nodes {
        loader.node(record);
    }
    for record in &doc.connections {
        loader.connection(record);
    }
    for record in &doc.groups {
        loader.group(record);
    }
    for record in &doc.variables {
        loader.variable(record);
    }

    log::debug!(
        "Loaded graph {} with {} node(s), {} warning(s)",
        doc.id,
        loader.graph.nodes().len(),
        loader.warnings.len()
    );
    LoadOutcome {
        graph: loader.graph,
        warnings: loader.warnings,
    }
}

/// Serialize a graph to pretty JSON
pub fn to_json(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&save(graph))?)
}

/// Parse JSON text and load it. Fails only when the text is not a document.
pub fn from_json(text: &str, registry: Arc<NodeRegistry>) -> Result<LoadOutcome> {
    let doc: GraphDocument = serde_json::from_str(text)?;
    Ok(load(&doc, registry))
}

struct Loader {
    graph: Graph,
    warnings: Vec<LoadWarning>,
}

impl Loader {
    fn warn(&mut self, kind: LoadWarningKind, message: String) {
        log::warn!("Skipped while loading graph: {}", message);
        self.warnings.push(LoadWarning { kind, message });
    }

    fn node(&mut self, record: &NodeRecord) {
        let config = NodeConfig {
            id: Some(record.id),
            type_name: record.type_name.clone(),
            position: (record.position.x, record.position.y),
            properties: BTreeMap::new(),
            value_input_size: record.value_input_size,
            value_output_size: record.value_output_size,
        };
        if let Err(e) = self.graph.insert_node(config) {
            self.warn(
                LoadWarningKind::Node,
                format!("node {} ({}): {}", record.id, record.type_name, e),
            );
            return;
        }

        // Mismatched shapes stay at the default, unknown names are ignored
        for (name, json) in &record.properties {
            let value = self
                .graph
                .node(record.id)
                .and_then(|n| n.layout.property(name))
                .and_then(|p| Value::from_json(json, &p.data_type));
            if let Some(value) = value {
                if let Err(e) = self.graph.set_property(record.id, name, value) {
                    log::debug!("Property '{}' on {} left at default: {}", name, record.id, e);
                }
            }
        }
    }

    fn connection(&mut self, record: &ConnectionRecord) {
        let source = PortRef::new(record.out_id, record.out_slot);
        let target = PortRef::new(record.in_id, record.in_slot);
        if record.kind == ConnectionKind::Value {
            if let Some(existing) = self.graph.value_producer(target) {
                self.warn(
                    LoadWarningKind::Connection,
                    format!(
                        "Value connection {} -> {}: input already fed by {}",
                        source, target, existing
                    ),
                );
                return;
            }
        }
        let result = match record.kind {
            ConnectionKind::Value => self.graph.create_value_connection(source, target),
            ConnectionKind::Flow => self.graph.create_flow_connection(source, target),
        };
        if let Err(e) = result {
            self.warn(
                LoadWarningKind::Connection,
                format!("{:?} connection {} -> {}: {}", record.kind, source, target, e),
            );
        }
    }

    fn group(&mut self, record: &GroupRecord) {
        if self.graph.group(record.id).is_some() {
            self.warn(
                LoadWarningKind::Group,
                format!("duplicate group id {}", record.id),
            );
            return;
        }
        let mut group = NodeGroup::new(record.id, record.title.clone());
        for &member in &record.nodes {
            if self.graph.contains_node(member) {
                group.insert(member);
            } else {
                self.warn(
                    LoadWarningKind::Group,
                    format!("group '{}' drops unknown member {}", record.title, member),
                );
            }
        }
        self.graph.insert_group(group);
    }

    fn variable(&mut self, record: &VariableRecord) {
        let data_type = match self.graph.resolver().resolve_data_type(&record.data_type) {
            Ok(data_type) => data_type,
            Err(e) => {
                self.warn(
                    LoadWarningKind::Variable,
                    format!("variable '{}': {}", record.name, e),
                );
                return;
            }
        };

        let mut variable = GraphVariable::new(record.id, record.name.clone(), data_type, record.persistent);
        if record.persistent {
            if let Some(json) = &record.value {
                match Value::from_json(json, &variable.data_type) {
                    Some(value) => variable.value = value,
                    None => log::debug!(
                        "Variable '{}' value does not fit {}; using default",
                        record.name,
                        variable.data_type
                    ),
                }
            }
        }

        if let Err(e) = self.graph.insert_variable(variable) {
            self.warn(LoadWarningKind::Variable, e.to_string());
        }
    }
}
