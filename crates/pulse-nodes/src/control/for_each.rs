//! For Each Node
//!
//! Triggers `Body` once per list element, then `Completed`.

use async_trait::async_trait;
use pulse_engine::{
    EngineError, FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, Result, Value, ValuePortMetadata,
};

/// For Each Node
///
/// # Inputs
/// - `Start` (flow)
/// - `List` (List<T>)
///
/// # Outputs
/// - `Body` (flow) - Triggered once per element
/// - `Completed` (flow) - Triggered after the last element
/// - `Element` (T) - Current element
/// - `Index` (Int) - Position of the current element
pub struct ForEachNode;

impl ForEachNode {
    pub const IN_LIST: usize = 0;
    pub const OUT_ELEMENT: usize = 0;
    pub const OUT_INDEX: usize = 1;
    pub const FLOW_BODY: usize = 0;
    pub const FLOW_COMPLETED: usize = 1;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for ForEachNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("ForEach", NodeCategory::Control, "For Each")
            .generic("T")
            .with_description("Runs its body for every element of a list")
            .flow_input(FlowPortMetadata::new("Start", "Start"))
            .flow_output(FlowPortMetadata::new("Body", "Body"))
            .flow_output(FlowPortMetadata::new("Completed", "Completed"))
            .value_input(ValuePortMetadata::required("List", "List", "List<T>"))
            .value_output(ValuePortMetadata::optional("Element", "Element", "T"))
            .value_output(ValuePortMetadata::optional("Index", "Index", "Int"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(ForEachNode::registration));

#[async_trait]
impl Node for ForEachNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let Value::List(items) = cx.input_value(Self::IN_LIST).await? else {
            return Err(EngineError::failed("ForEach input is not a list"));
        };

        for (index, item) in items.into_iter().enumerate() {
            if cx.is_cancelled() {
                return Ok(());
            }
            cx.set_output(Self::OUT_ELEMENT, item)?;
            cx.set_output(Self::OUT_INDEX, index as i64)?;
            cx.trigger(Self::FLOW_BODY).await?;
        }

        if cx.is_cancelled() {
            return Ok(());
        }
        cx.trigger(Self::FLOW_COMPLETED).await
    }
}
