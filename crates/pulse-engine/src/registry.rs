//! Node type registry
//!
//! Maps base type names to static metadata and a factory. Generic types are
//! registered once under their base name (`Constant`, not `Constant<Int>`);
//! the resolver checks argument counts against the declared parameters.
//!
//! # Usage
//!
//! ```ignore
//! use pulse_engine::{NodeRegistry, NodeDescriptor, SharedNodeFactory};
//!
//! let mut registry = NodeRegistry::with_builtins();
//! registry.register(BlinkNode::descriptor(), Arc::new(SharedNodeFactory::new(BlinkNode)));
//! ```
//!
//! Built-in libraries submit a [`RegistrationFn`] with `inventory` so that
//! [`NodeRegistry::with_builtins`] picks up every linked node type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{NodeCategory, NodeMetadata};
use crate::node::{Node, NodeFactory, SharedNodeFactory};

/// Metadata plus factory for one node type
#[derive(Clone)]
pub struct NodeRegistration {
    pub metadata: NodeMetadata,
    pub factory: Arc<dyn NodeFactory>,
}

impl NodeRegistration {
    pub fn new(metadata: NodeMetadata, factory: impl NodeFactory + 'static) -> Self {
        Self {
            metadata,
            factory: Arc::new(factory),
        }
    }

    /// Registration for a stateless node shared by every instance
    pub fn shared(metadata: NodeMetadata, node: impl Node + 'static) -> Self {
        Self::new(metadata, SharedNodeFactory::new(node))
    }
}

/// Link-time registration of a built-in node type
///
/// ```ignore
/// inventory::submit!(pulse_engine::RegistrationFn(PrintNode::registration));
/// ```
pub struct RegistrationFn(pub fn() -> NodeRegistration);

inventory::collect!(RegistrationFn);

/// Registry of node types
#[derive(Clone, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, NodeRegistration>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every node type submitted with `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<RegistrationFn> {
            registry.add((registration.0)());
        }
        log::debug!("Registered {} built-in node types", registry.entries.len());
        registry
    }

    /// Register a node type with metadata and a factory.
    ///
    /// A later registration under the same base name replaces the earlier one.
    pub fn register(&mut self, metadata: NodeMetadata, factory: Arc<dyn NodeFactory>) {
        self.add(NodeRegistration { metadata, factory });
    }

    /// Register a prepared entry
    pub fn add(&mut self, registration: NodeRegistration) {
        let node_type = registration.metadata.node_type.clone();
        if self.entries.insert(node_type.clone(), registration).is_some() {
            log::debug!("Node type '{}' re-registered", node_type);
        }
    }

    /// Look up a registration by base type name
    pub fn get(&self, node_type: &str) -> Option<&NodeRegistration> {
        self.entries.get(node_type)
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List all registered base type names, sorted
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Get all registered metadata
    pub fn all_metadata(&self) -> Vec<&NodeMetadata> {
        self.entries.values().map(|e| &e.metadata).collect()
    }

    /// Get metadata grouped by category
    pub fn metadata_by_category(&self) -> HashMap<NodeCategory, Vec<&NodeMetadata>> {
        let mut grouped: HashMap<NodeCategory, Vec<&NodeMetadata>> = HashMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.metadata.category)
                .or_default()
                .push(&entry.metadata);
        }
        grouped
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the same
    /// base type name.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FlowPortMetadata, ValuePortMetadata};
    use crate::error::Result;
    use crate::node::NodeSetup;
    use crate::pulse::NodeContext;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Node for Noop {
        async fn process(&self, _cx: &NodeContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn test_metadata(node_type: &str, category: NodeCategory) -> NodeMetadata {
        NodeMetadata::new(node_type, category, format!("Test {}", node_type))
            .flow_input(FlowPortMetadata::new("In", "In"))
            .value_input(ValuePortMetadata::optional("Value", "Value", "Any"))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        registry.add(NodeRegistration::shared(
            test_metadata("Blink", NodeCategory::Host),
            Noop,
        ));

        assert!(registry.has_node_type("Blink"));
        assert!(!registry.has_node_type("Unknown"));
        assert_eq!(registry.get_metadata("Blink").unwrap().label, "Test Blink");
    }

    #[test]
    fn test_closure_factory() {
        let mut registry = NodeRegistry::new();
        registry.register(
            test_metadata("Blink", NodeCategory::Host),
            Arc::new(|_setup: &NodeSetup<'_>| Ok(Arc::new(Noop) as Arc<dyn Node>)),
        );
        assert!(registry.get("Blink").is_some());
    }

    #[test]
    fn test_merge_override() {
        let mut first = NodeRegistry::new();
        let mut meta = test_metadata("Blink", NodeCategory::Host);
        meta.label = "Original".to_string();
        first.add(NodeRegistration::shared(meta, Noop));

        let mut second = NodeRegistry::new();
        let mut meta = test_metadata("Blink", NodeCategory::Host);
        meta.label = "Override".to_string();
        second.add(NodeRegistration::shared(meta, Noop));
        second.add(NodeRegistration::shared(
            test_metadata("Beep", NodeCategory::Output),
            Noop,
        ));

        first.merge(second);
        assert_eq!(first.node_types(), vec!["Beep", "Blink"]);
        assert_eq!(first.get_metadata("Blink").unwrap().label, "Override");
    }

    #[test]
    fn test_metadata_by_category() {
        let mut registry = NodeRegistry::new();
        registry.add(NodeRegistration::shared(
            test_metadata("Blink", NodeCategory::Host),
            Noop,
        ));
        registry.add(NodeRegistration::shared(
            test_metadata("Beep", NodeCategory::Output),
            Noop,
        ));

        let grouped = registry.metadata_by_category();
        assert_eq!(grouped.get(&NodeCategory::Host).unwrap().len(), 1);
        assert_eq!(grouped.get(&NodeCategory::Output).unwrap().len(), 1);
    }
}
