//! Node type descriptor trait and metadata types
//!
//! Node types describe their ports and properties statically, at registration
//! time. The resolver and the serializer read this metadata to enumerate a
//! type's shape without constructing an instance.
//!
//! Port and property types are written as descriptor *templates*: for a
//! generic node such as `Constant<T>`, the output port declares `"T"` and the
//! resolver substitutes the concrete argument.

use serde::{Deserialize, Serialize};

/// Trait for node implementations that can describe their metadata
///
/// # Example
///
/// ```ignore
/// impl NodeDescriptor for PrintNode {
///     fn descriptor() -> NodeMetadata {
///         NodeMetadata::new("Print", NodeCategory::Output, "Print")
///             .flow_input(FlowPortMetadata::new("In", "In"))
///             .flow_output(FlowPortMetadata::new("Out", "Out"))
///             .value_input(ValuePortMetadata::optional("Value", "Value", "Any"))
///     }
/// }
/// ```
pub trait NodeDescriptor {
    /// Get the static metadata for this node type
    fn descriptor() -> NodeMetadata
    where
        Self: Sized;
}

/// Category of a node type, for palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Entry points fired by external triggers
    Event,
    /// Constants and collection construction
    Data,
    /// Arithmetic and comparison
    Math,
    /// Branches and loops
    Control,
    /// Graph variable access
    Variable,
    /// Nodes that emit results to the host
    Output,
    /// Domain nodes supplied by the host application
    Host,
}

/// Complete metadata for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Base type name (e.g., "Repeat", "Constant")
    pub node_type: String,
    /// Names of the generic parameters, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_params: Vec<String>,
    /// Category for UI grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    #[serde(default)]
    pub description: String,
    /// Value input ports
    #[serde(default)]
    pub value_inputs: Vec<ValuePortMetadata>,
    /// Value output ports
    #[serde(default)]
    pub value_outputs: Vec<ValuePortMetadata>,
    /// Flow input ports
    #[serde(default)]
    pub flow_inputs: Vec<FlowPortMetadata>,
    /// Flow output ports
    #[serde(default)]
    pub flow_outputs: Vec<FlowPortMetadata>,
    /// Configurable properties
    #[serde(default)]
    pub properties: Vec<PropertyMetadata>,
}

impl NodeMetadata {
    /// Create metadata with no ports
    pub fn new(
        node_type: impl Into<String>,
        category: NodeCategory,
        label: impl Into<String>,
    ) -> Self {
        Self {
            node_type: node_type.into(),
            generic_params: Vec::new(),
            category,
            label: label.into(),
            description: String::new(),
            value_inputs: Vec::new(),
            value_outputs: Vec::new(),
            flow_inputs: Vec::new(),
            flow_outputs: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Declare a generic parameter
    pub fn generic(mut self, name: impl Into<String>) -> Self {
        self.generic_params.push(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value_input(mut self, port: ValuePortMetadata) -> Self {
        self.value_inputs.push(port);
        self
    }

    pub fn value_output(mut self, port: ValuePortMetadata) -> Self {
        self.value_outputs.push(port);
        self
    }

    pub fn flow_input(mut self, port: FlowPortMetadata) -> Self {
        self.flow_inputs.push(port);
        self
    }

    pub fn flow_output(mut self, port: FlowPortMetadata) -> Self {
        self.flow_outputs.push(port);
        self
    }

    pub fn property(mut self, property: PropertyMetadata) -> Self {
        self.properties.push(property);
        self
    }

    /// Whether the node takes part in control flow.
    ///
    /// Flow nodes run only when triggered; nodes without flow ports are
    /// evaluated lazily when one of their outputs is read.
    pub fn is_flow_node(&self) -> bool {
        !self.flow_inputs.is_empty() || !self.flow_outputs.is_empty()
    }

    /// Whether the value inputs end in a variadic template
    pub fn has_variadic_inputs(&self) -> bool {
        self.value_inputs.last().is_some_and(|p| p.variadic)
    }

    /// Whether the value outputs end in a variadic template
    pub fn has_variadic_outputs(&self) -> bool {
        self.value_outputs.last().is_some_and(|p| p.variadic)
    }

    /// Find a property declaration by id
    pub fn find_property(&self, id: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.id == id)
    }
}

/// Metadata for a value port
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuePortMetadata {
    /// Port identifier
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Element type template (may mention generic parameters)
    pub data_type: String,
    /// Whether an input must be connected for the graph to validate
    pub required: bool,
    /// Static default used when the input is unconnected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Template repeated to fill the per-instance port count
    #[serde(default)]
    pub variadic: bool,
}

impl ValuePortMetadata {
    /// Create a new port metadata
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type: data_type.into(),
            required,
            default_value: None,
            variadic: false,
        }
    }

    /// Create a required port
    pub fn required(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self::new(id, label, data_type, true)
    }

    /// Create an optional port
    pub fn optional(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self::new(id, label, data_type, false)
    }

    /// Set a default value for this port
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark this port as the variadic template of its list
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Metadata for a flow port
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPortMetadata {
    pub id: String,
    pub label: String,
}

impl FlowPortMetadata {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Metadata for a configurable property
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMetadata {
    pub id: String,
    pub label: String,
    /// Type template (may mention generic parameters)
    pub data_type: String,
    /// Persisted default; `None` means the type default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl PropertyMetadata {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type: data_type.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }
}
