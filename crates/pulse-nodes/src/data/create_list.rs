//! Create List Node
//!
//! Collects a variable number of inputs into a list. The `Item` input is
//! variadic: each instance chooses its own count via `value_input_size`.

use async_trait::async_trait;
use pulse_engine::{
    Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata, NodeRegistration, Result,
    ValuePortMetadata,
};

/// Create List Node
///
/// # Inputs
/// - `Item0`..`ItemN` (T)
///
/// # Outputs
/// - `List` (List<T>) - The inputs in slot order
pub struct CreateListNode;

impl CreateListNode {
    pub const OUT_LIST: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for CreateListNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("CreateList", NodeCategory::Data, "Create List")
            .generic("T")
            .with_description("Builds a list from its inputs")
            .value_input(ValuePortMetadata::optional("Item", "Item", "T").variadic())
            .value_output(ValuePortMetadata::optional("List", "List", "List<T>"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(CreateListNode::registration));

#[async_trait]
impl Node for CreateListNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let mut items = Vec::with_capacity(cx.value_input_count());
        for slot in 0..cx.value_input_count() {
            items.push(cx.input_value(slot).await?);
        }
        cx.set_output(Self::OUT_LIST, items)
    }
}
