//! Get Variable Node
//!
//! Reads a graph variable by name. This is a pure node, so the read happens
//! the first time a consumer needs it and is memoized until a `SetVariable`
//! in the same pulse writes that variable.

use async_trait::async_trait;
use pulse_engine::{
    Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata, NodeRegistration,
    PropertyMetadata, Result, ValuePortMetadata,
};

/// Get Variable Node
///
/// # Properties
/// - `Name` - Variable to read
///
/// # Outputs
/// - `Value` (T) - Current value, coerced to `T`
pub struct GetVariableNode;

impl GetVariableNode {
    pub const PROPERTY_NAME: &'static str = "Name";
    pub const OUT_VALUE: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for GetVariableNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("GetVariable", NodeCategory::Variable, "Get Variable")
            .generic("T")
            .with_description("Reads a graph variable")
            .property(PropertyMetadata::new(Self::PROPERTY_NAME, "Name", "String"))
            .value_output(ValuePortMetadata::optional("Value", "Value", "T"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(GetVariableNode::registration));

#[async_trait]
impl Node for GetVariableNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let name: String = cx.property(Self::PROPERTY_NAME)?;
        let value = cx.variable(&name)?;
        cx.set_output(Self::OUT_VALUE, value)
    }
}
