//! Constant Node
//!
//! Outputs its configured `Value` property. Generic over the value type, so
//! `Constant<Int>`, `Constant<List<String>>` and so on are all valid.

use async_trait::async_trait;
use pulse_engine::{
    Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata, NodeRegistration,
    PropertyMetadata, Result, Value, ValuePortMetadata,
};

/// Constant Node
///
/// # Properties
/// - `Value` (T) - The constant
///
/// # Outputs
/// - `Value` (T)
pub struct ConstantNode;

impl ConstantNode {
    pub const PROPERTY_VALUE: &'static str = "Value";
    pub const OUT_VALUE: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for ConstantNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Constant", NodeCategory::Data, "Constant")
            .generic("T")
            .with_description("Outputs a fixed value")
            .property(PropertyMetadata::new(Self::PROPERTY_VALUE, "Value", "T"))
            .value_output(ValuePortMetadata::optional("Value", "Value", "T"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(ConstantNode::registration));

#[async_trait]
impl Node for ConstantNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let value: Value = cx.property(Self::PROPERTY_VALUE)?;
        cx.set_output(Self::OUT_VALUE, value)
    }
}
