//! Add Node
//!
//! Adds two numbers. Only numeric instantiations exist: `Add<Int>` and
//! `Add<Float>`. Any other argument is rejected when the node is created.

use std::sync::Arc;

use async_trait::async_trait;
use pulse_engine::{
    DataType, EngineError, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, NodeSetup, Result, Value, ValuePortMetadata,
};

/// Add Node
///
/// # Inputs
/// - `A` (T)
/// - `B` (T)
///
/// # Outputs
/// - `Sum` (T) - `A + B`; integer overflow is an error
pub struct AddNode {
    data_type: DataType,
}

impl AddNode {
    pub const IN_A: usize = 0;
    pub const IN_B: usize = 1;
    pub const OUT_SUM: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::new(Self::descriptor(), Self::create)
    }

    fn create(setup: &NodeSetup<'_>) -> Result<Arc<dyn Node>> {
        match setup.generics.first() {
            Some(data_type) if data_type.is_numeric() => Ok(Arc::new(Self {
                data_type: data_type.clone(),
            })),
            other => Err(EngineError::unresolved(
                format!("Add<{}>", other.map(ToString::to_string).unwrap_or_default()),
                "Add is only defined for Int and Float",
            )),
        }
    }
}

impl NodeDescriptor for AddNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Add", NodeCategory::Math, "Add")
            .generic("T")
            .with_description("Adds two numbers")
            .value_input(ValuePortMetadata::optional("A", "A", "T"))
            .value_input(ValuePortMetadata::optional("B", "B", "T"))
            .value_output(ValuePortMetadata::optional("Sum", "Sum", "T"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(AddNode::registration));

#[async_trait]
impl Node for AddNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let sum = if self.data_type == DataType::Int {
            let a: i64 = cx.input(Self::IN_A).await?;
            let b: i64 = cx.input(Self::IN_B).await?;
            let sum = a
                .checked_add(b)
                .ok_or_else(|| EngineError::failed(format!("{} + {} overflows Int", a, b)))?;
            Value::Int(sum)
        } else {
            let a: f64 = cx.input(Self::IN_A).await?;
            let b: f64 = cx.input(Self::IN_B).await?;
            Value::Float(a + b)
        };
        cx.set_output(Self::OUT_SUM, sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CollectingPrintSink;
    use crate::test_utils::print_extensions;
    use pulse_engine::{Graph, GraphBuilder, NodeRegistry, Pulse};

    #[test]
    fn test_non_numeric_rejected() {
        let mut graph = Graph::new(Arc::new(NodeRegistry::with_builtins()));
        let err = graph.add_node(None, "Add<String>").unwrap_err();
        assert!(matches!(err, EngineError::TypeResolution { .. }));
        assert!(graph.nodes().is_empty());

        assert!(graph.add_node(None, "Add<Float>").is_ok());
    }

    async fn run_add(type_name: &str, a: Value, b: Value) -> Result<Vec<Value>> {
        let built = GraphBuilder::new(Arc::new(NodeRegistry::with_builtins()))
            .add_node("a", "Constant<Any>")
            .with_property("Value", a)
            .add_node("b", "Constant<Any>")
            .with_property("Value", b)
            .add_node("add", type_name)
            .add_node("print", "Print")
            .value("a", "Value", "add", "A")
            .value("b", "Value", "add", "B")
            .value("add", "Sum", "print", "Value")
            .build()?;

        let sink = Arc::new(CollectingPrintSink::new());
        Pulse::new(&built.graph)
            .with_extensions(print_extensions(sink.clone()))
            .run(built.id("print").unwrap(), 0)
            .await?;
        Ok(sink.values())
    }

    #[tokio::test]
    async fn test_int_and_float_sums() {
        assert_eq!(
            run_add("Add<Int>", Value::Int(2), Value::Int(40)).await.unwrap(),
            vec![Value::Int(42)]
        );
        assert_eq!(
            run_add("Add<Float>", Value::Float(0.5), Value::Int(1)).await.unwrap(),
            vec![Value::Float(1.5)]
        );
    }

    #[tokio::test]
    async fn test_overflow_fails_pulse() {
        let err = run_add("Add<Int>", Value::Int(i64::MAX), Value::Int(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NodeProcess { ref node_type, .. } if node_type == "Add<Int>"));
    }
}
