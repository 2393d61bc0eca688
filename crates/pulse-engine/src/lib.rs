//! Pulse Engine - visual dataflow and control-flow graphs
//!
//! A graph is a set of typed nodes joined by two kinds of connection:
//!
//! - **Flow** connections sequence work. A pulse enters a flow node through a
//!   flow input; the node runs and decides which flow outputs to trigger.
//! - **Value** connections carry data. Pure nodes (no flow ports) are
//!   evaluated lazily when a consumer reads their output, at most once per
//!   pulse unless an upstream flow node writes a fresh value.
//!
//! # Architecture
//!
//! - `NodeRegistry`: node types by base name, filled via `inventory`
//! - `TypeResolver`: parses `Constant<List<Int>>` style type names and
//!   instantiates port templates
//! - `Graph`: nodes, connections, groups and variables, with cycle and type
//!   checks on every edit
//! - `Pulse`: one run through the graph from an entry node
//! - `UndoStack`: compressed snapshot history
//!
//! # Example
//!
//! ```ignore
//! use pulse_engine::{GraphBuilder, NodeRegistry, Pulse};
//!
//! let registry = Arc::new(NodeRegistry::with_builtins());
//! let built = GraphBuilder::new(registry)
//!     .add_node("start", "OnTrigger")
//!     .with_property("Event", "tick")
//!     .add_node("print", "Print")
//!     .flow("start", "Fired", "print", "In")
//!     .value("start", "Payload", "print", "Value")
//!     .build()?;
//!
//! let report = Pulse::new(&built.graph).with_payload(42).run_event("tick").await?;
//! ```

pub mod builder;
pub mod connection;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod events;
pub mod extensions;
pub mod graph;
pub mod groups;
pub mod node;
pub mod pulse;
pub mod registry;
pub mod resolver;
pub mod type_name;
pub mod types;
pub mod undo;
pub mod validation;
pub mod variables;

#[cfg(test)]
mod test_support;

// Re-export key types
pub use builder::{BuiltGraph, GraphBuilder};
pub use connection::{Connection, ConnectionKind, PortRef};
pub use descriptor::{
    FlowPortMetadata, NodeCategory, NodeDescriptor, NodeMetadata, PropertyMetadata,
    ValuePortMetadata,
};
pub use document::{GraphDocument, LoadOutcome, LoadWarning, LoadWarningKind};
pub use error::{EngineError, Result};
pub use events::{
    ChannelEventSink, EventError, EventSink, NullEventSink, PulseEvent, VecEventSink,
};
pub use extensions::{extension_keys, ExecutorExtensions};
pub use graph::{Graph, NodeConfig};
pub use groups::NodeGroup;
pub use node::{GraphNode, Node, NodeFactory, NodeLayout, NodeSetup, SharedNodeFactory};
pub use pulse::{NodeContext, Pulse, PulseCancellation, PulseOptions, PulseReport};
pub use registry::{NodeRegistration, NodeRegistry, RegistrationFn};
pub use resolver::TypeResolver;
pub use type_name::TypeDescriptor;
pub use types::{DataType, FromValue, GroupId, NodeId, Value, VariableId};
pub use undo::UndoStack;
pub use validation::{validate_graph, ValidationError};
pub use variables::{GraphVariable, VariableStore};

// Node libraries submit registrations through this
pub use inventory;
