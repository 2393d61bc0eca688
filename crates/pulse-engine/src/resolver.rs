//! Generic type resolution
//!
//! Turns descriptor text into either a value [`DataType`] or a concrete node
//! type: the registry entry for the base name plus the resolved generic
//! arguments. Formatting is the inverse, so for any valid descriptor
//! `format(resolve(s))` equals the canonical form of `s`.

use std::sync::Arc;

use crate::descriptor::{NodeMetadata, ValuePortMetadata};
use crate::error::{EngineError, Result};
use crate::node::{Node, NodeLayout, NodeSetup, ResolvedProperty, ResolvedValuePort};
use crate::registry::{NodeRegistration, NodeRegistry};
use crate::type_name::TypeDescriptor;
use crate::types::{DataType, NodeId, Value};

/// Number of ports a variadic template expands to when no size is configured
pub const DEFAULT_VARIADIC_PORTS: usize = 2;

/// Resolves descriptor text against a registry
#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a value type descriptor such as `List<Int>`
    pub fn resolve_data_type(&self, text: &str) -> Result<DataType> {
        DataType::from_descriptor(&TypeDescriptor::parse(text)?)
    }

    /// Resolve a node type descriptor such as `Constant<List<Int>>`
    pub fn resolve_node_type(&self, text: &str) -> Result<ResolvedNodeType<'a>> {
        let descriptor = TypeDescriptor::parse(text)?;
        let registration = self.registry.get(&descriptor.name).ok_or_else(|| {
            EngineError::unresolved(descriptor.canonical(), "unknown node type")
        })?;

        let expected = registration.metadata.generic_params.len();
        if descriptor.args.len() != expected {
            return Err(EngineError::GenericArity {
                name: descriptor.name,
                expected,
                found: descriptor.args.len(),
            });
        }

        let generics = descriptor
            .args
            .iter()
            .map(DataType::from_descriptor)
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedNodeType {
            registration,
            generics,
        })
    }

    /// Canonical descriptor of a value type
    pub fn format_data_type(&self, data_type: &DataType) -> String {
        data_type.to_descriptor().canonical()
    }

    /// Canonical descriptor of a resolved node type
    pub fn format_node_type(&self, resolved: &ResolvedNodeType<'_>) -> String {
        resolved.canonical()
    }
}

/// A registry entry together with concrete generic arguments
#[derive(Clone)]
pub struct ResolvedNodeType<'a> {
    registration: &'a NodeRegistration,
    generics: Vec<DataType>,
}

impl std::fmt::Debug for ResolvedNodeType<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedNodeType")
            .field("node_type", &self.node_type())
            .field("generics", &self.generics)
            .finish()
    }
}

impl<'a> ResolvedNodeType<'a> {
    /// Base type name
    pub fn node_type(&self) -> &'a str {
        &self.registration.metadata.node_type
    }

    pub fn metadata(&self) -> &'a NodeMetadata {
        &self.registration.metadata
    }

    pub fn generics(&self) -> &[DataType] {
        &self.generics
    }

    pub fn into_generics(self) -> Vec<DataType> {
        self.generics
    }

    /// Canonical descriptor text
    pub fn canonical(&self) -> String {
        TypeDescriptor::generic(
            self.node_type(),
            self.generics.iter().map(DataType::to_descriptor).collect(),
        )
        .canonical()
    }

    /// Concrete ports and properties for an instance with the given
    /// variable-arity sizes. Sizes are ignored for fixed-arity port lists.
    pub fn layout(
        &self,
        value_input_size: Option<usize>,
        value_output_size: Option<usize>,
    ) -> Result<NodeLayout> {
        let meta = self.metadata();
        let properties = meta
            .properties
            .iter()
            .map(|p| {
                let data_type = self.instantiate(&p.data_type)?;
                let default_value = default_for(p.default_value.as_ref(), &data_type);
                Ok(ResolvedProperty {
                    id: p.id.clone(),
                    data_type,
                    default_value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NodeLayout {
            value_inputs: self.value_ports(&meta.value_inputs, value_input_size)?,
            value_outputs: self.value_ports(&meta.value_outputs, value_output_size)?,
            flow_inputs: meta.flow_inputs.iter().map(|p| p.id.clone()).collect(),
            flow_outputs: meta.flow_outputs.iter().map(|p| p.id.clone()).collect(),
            properties,
        })
    }

    /// Build the node logic for an instance
    pub fn create_node(&self, id: NodeId, layout: &NodeLayout) -> Result<Arc<dyn Node>> {
        let setup = NodeSetup {
            id,
            generics: &self.generics,
            layout,
        };
        self.registration.factory.create(&setup)
    }

    /// Substitute the generic arguments into a port or property template
    pub fn instantiate(&self, template: &str) -> Result<DataType> {
        let args: Vec<TypeDescriptor> = self.generics.iter().map(DataType::to_descriptor).collect();
        let descriptor =
            TypeDescriptor::parse(template)?.substitute(&self.metadata().generic_params, &args);
        DataType::from_descriptor(&descriptor)
    }

    fn value_ports(
        &self,
        ports: &[ValuePortMetadata],
        size: Option<usize>,
    ) -> Result<Vec<ResolvedValuePort>> {
        let mut resolved = Vec::with_capacity(ports.len());
        for port in ports {
            let data_type = self.instantiate(&port.data_type)?;
            let default_value = default_for(port.default_value.as_ref(), &data_type);

            if !port.variadic {
                resolved.push(ResolvedValuePort {
                    id: port.id.clone(),
                    data_type,
                    required: port.required,
                    default_value,
                });
                continue;
            }

            // The template is last in its list; expand it to fill `size`
            let fixed = resolved.len();
            let total = size.unwrap_or(fixed + DEFAULT_VARIADIC_PORTS).max(fixed);
            for index in 0..total - fixed {
                resolved.push(ResolvedValuePort {
                    id: format!("{}{}", port.id, index),
                    data_type: data_type.clone(),
                    required: port.required,
                    default_value: default_value.clone(),
                });
            }
            break;
        }
        Ok(resolved)
    }
}

fn default_for(json: Option<&serde_json::Value>, data_type: &DataType) -> Value {
    json.and_then(|j| Value::from_json(j, data_type))
        .unwrap_or_else(|| data_type.default_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FlowPortMetadata, NodeCategory, PropertyMetadata};
    use crate::pulse::NodeContext;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Node for Noop {
        async fn process(&self, _cx: &NodeContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.add(NodeRegistration::shared(
            NodeMetadata::new("Constant", NodeCategory::Data, "Constant")
                .generic("T")
                .property(PropertyMetadata::new("Value", "Value", "T"))
                .value_output(ValuePortMetadata::optional("Value", "Value", "T")),
            Noop,
        ));
        registry.add(NodeRegistration::shared(
            NodeMetadata::new("CreateList", NodeCategory::Data, "Create List")
                .generic("T")
                .value_input(ValuePortMetadata::optional("Item", "Item", "T").variadic())
                .value_output(ValuePortMetadata::optional("List", "List", "List<T>")),
            Noop,
        ));
        registry.add(NodeRegistration::shared(
            NodeMetadata::new("Repeat", NodeCategory::Control, "Repeat")
                .flow_input(FlowPortMetadata::new("Start", "Start"))
                .value_input(
                    ValuePortMetadata::optional("Count", "Count", "Int")
                        .with_default(serde_json::json!(1)),
                ),
            Noop,
        ));
        registry
    }

    #[test]
    fn test_descriptor_round_trip_nesting_levels() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);

        for text in [
            "Repeat",
            "Constant<Int>",
            "Constant<List<Int>>",
            "Constant< Map<String, List<Float>> >",
        ] {
            let resolved = resolver.resolve_node_type(text).unwrap();
            let canonical = TypeDescriptor::parse(text).unwrap().canonical();
            assert_eq!(resolver.format_node_type(&resolved), canonical);
        }

        for text in ["Int", "List<Bool>", "Map<String,List<Int>>"] {
            let ty = resolver.resolve_data_type(text).unwrap();
            assert_eq!(resolver.format_data_type(&ty), text);
        }
    }

    #[test]
    fn test_resolution_errors() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);

        assert!(matches!(
            resolver.resolve_node_type("Vector3<Int>"),
            Err(EngineError::TypeResolution { .. })
        ));
        assert!(matches!(
            resolver.resolve_node_type("Constant"),
            Err(EngineError::GenericArity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            resolver.resolve_node_type("Constant<Int,Float>"),
            Err(EngineError::GenericArity { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            resolver.resolve_node_type("Constant<Widget>"),
            Err(EngineError::TypeResolution { .. })
        ));
    }

    #[test]
    fn test_layout_substitutes_generics() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let resolved = resolver.resolve_node_type("Constant<List<Int>>").unwrap();
        let layout = resolved.layout(None, None).unwrap();

        assert_eq!(layout.value_outputs[0].data_type, DataType::list(DataType::Int));
        assert_eq!(layout.properties[0].default_value, Value::List(Vec::new()));
        assert!(!layout.is_flow_node());
    }

    #[test]
    fn test_variadic_expansion() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let resolved = resolver.resolve_node_type("CreateList<Float>").unwrap();

        let layout = resolved.layout(None, None).unwrap();
        let ids: Vec<&str> = layout.value_inputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Item0", "Item1"]);

        let layout = resolved.layout(Some(4), Some(9)).unwrap();
        assert_eq!(layout.value_inputs.len(), 4);
        assert!(layout.value_inputs.iter().all(|p| p.data_type == DataType::Float));
        // fixed output list ignores the size
        assert_eq!(layout.value_outputs.len(), 1);
    }

    #[test]
    fn test_port_default_from_metadata() {
        let registry = registry();
        let resolver = TypeResolver::new(&registry);
        let layout = resolver
            .resolve_node_type("Repeat")
            .unwrap()
            .layout(None, None)
            .unwrap();
        assert_eq!(layout.value_inputs[0].default_value, Value::Int(1));
        assert!(layout.is_flow_node());
    }
}
