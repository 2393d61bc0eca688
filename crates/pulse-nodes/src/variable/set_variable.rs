//! Set Variable Node
//!
//! Writes a graph variable by name. The write is visible to every pulse
//! immediately and is not undone if the pulse later fails.

use async_trait::async_trait;
use pulse_engine::{
    FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, PropertyMetadata, Result, ValuePortMetadata,
};

/// Set Variable Node
///
/// # Properties
/// - `Name` - Variable to write
///
/// # Inputs
/// - `In` (flow)
/// - `Value` (T)
///
/// # Outputs
/// - `Out` (flow) - Triggered after the write
/// - `Value` (T) - The value written
pub struct SetVariableNode;

impl SetVariableNode {
    pub const PROPERTY_NAME: &'static str = "Name";
    pub const IN_VALUE: usize = 0;
    pub const OUT_VALUE: usize = 0;
    pub const FLOW_OUT: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for SetVariableNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("SetVariable", NodeCategory::Variable, "Set Variable")
            .generic("T")
            .with_description("Writes a graph variable")
            .property(PropertyMetadata::new(Self::PROPERTY_NAME, "Name", "String"))
            .flow_input(FlowPortMetadata::new("In", "In"))
            .flow_output(FlowPortMetadata::new("Out", "Out"))
            .value_input(ValuePortMetadata::optional("Value", "Value", "T"))
            .value_output(ValuePortMetadata::optional("Value", "Value", "T"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(SetVariableNode::registration));

#[async_trait]
impl Node for SetVariableNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let name: String = cx.property(Self::PROPERTY_NAME)?;
        let value = cx.input_value(Self::IN_VALUE).await?;

        cx.set_variable(&name, value.clone())?;
        log::debug!("SetVariable {}: {} = {}", cx.node_id(), name, value);

        cx.set_output(Self::OUT_VALUE, value)?;
        cx.trigger(Self::FLOW_OUT).await
    }
}
