//! Compare Node
//!
//! Compares two values with the operator in its `Operator` property.
//! Numbers compare numerically (Int and Float mix), strings lexically; other
//! types support only `==` and `!=`.

use std::cmp::Ordering;

use async_trait::async_trait;
use pulse_engine::{
    EngineError, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata, NodeRegistration,
    PropertyMetadata, Result, Value, ValuePortMetadata,
};

/// Compare Node
///
/// # Properties
/// - `Operator` - One of `==`, `!=`, `<`, `<=`, `>`, `>=` (default `==`)
///
/// # Inputs
/// - `A` (T)
/// - `B` (T)
///
/// # Outputs
/// - `Result` (Bool)
pub struct CompareNode;

impl CompareNode {
    pub const PROPERTY_OPERATOR: &'static str = "Operator";
    pub const IN_A: usize = 0;
    pub const IN_B: usize = 1;
    pub const OUT_RESULT: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for CompareNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Compare", NodeCategory::Math, "Compare")
            .generic("T")
            .with_description("Compares two values")
            .property(
                PropertyMetadata::new(Self::PROPERTY_OPERATOR, "Operator", "String")
                    .with_default(serde_json::json!("==")),
            )
            .value_input(ValuePortMetadata::optional("A", "A", "T"))
            .value_input(ValuePortMetadata::optional("B", "B", "T"))
            .value_output(ValuePortMetadata::optional("Result", "Result", "Bool"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(CompareNode::registration));

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare(operator: &str, a: &Value, b: &Value) -> Result<bool> {
    let unordered = || {
        EngineError::failed(format!(
            "cannot order {} and {} with '{}'",
            a.kind(),
            b.kind(),
            operator
        ))
    };
    let equal = || match ordering(a, b) {
        Some(order) => order == Ordering::Equal,
        None => a == b,
    };

    match operator {
        "==" => Ok(equal()),
        "!=" => Ok(!equal()),
        "<" => ordering(a, b).map(Ordering::is_lt).ok_or_else(unordered),
        "<=" => ordering(a, b).map(Ordering::is_le).ok_or_else(unordered),
        ">" => ordering(a, b).map(Ordering::is_gt).ok_or_else(unordered),
        ">=" => ordering(a, b).map(Ordering::is_ge).ok_or_else(unordered),
        other => Err(EngineError::failed(format!("unknown operator '{}'", other))),
    }
}

#[async_trait]
impl Node for CompareNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let operator: String = cx.property(Self::PROPERTY_OPERATOR)?;
        let a = cx.input_value(Self::IN_A).await?;
        let b = cx.input_value(Self::IN_B).await?;
        cx.set_output(Self::OUT_RESULT, compare(&operator, &a, &b)?)
    }
}
