//! Repeat Node
//!
//! Triggers `Iteration` `Count` times, then `Finished` once. The loop polls
//! the pulse's cancellation flag before every iteration and stops without
//! firing `Finished` once it is set.

use async_trait::async_trait;
use pulse_engine::{
    FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, Result, ValuePortMetadata,
};

/// Repeat Node
///
/// # Inputs
/// - `Start` (flow)
/// - `Count` (Int) - Number of iterations; zero or negative skips the body
///
/// # Outputs
/// - `Iteration` (flow) - Triggered once per iteration
/// - `Finished` (flow) - Triggered after the last iteration
/// - `Index` (Int) - Current iteration, starting at 0
pub struct RepeatNode;

impl RepeatNode {
    pub const IN_COUNT: usize = 0;
    pub const OUT_INDEX: usize = 0;
    pub const FLOW_ITERATION: usize = 0;
    pub const FLOW_FINISHED: usize = 1;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for RepeatNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Repeat", NodeCategory::Control, "Repeat")
            .with_description("Runs its body a fixed number of times")
            .flow_input(FlowPortMetadata::new("Start", "Start"))
            .flow_output(FlowPortMetadata::new("Iteration", "Iteration"))
            .flow_output(FlowPortMetadata::new("Finished", "Finished"))
            .value_input(ValuePortMetadata::optional("Count", "Count", "Int"))
            .value_output(ValuePortMetadata::optional("Index", "Index", "Int"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(RepeatNode::registration));

#[async_trait]
impl Node for RepeatNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let count: i64 = cx.input(Self::IN_COUNT).await?;
        log::debug!("Repeat {}: {} iteration(s)", cx.node_id(), count);

        for index in 0..count.max(0) {
            if cx.is_cancelled() {
                log::debug!("Repeat {}: cancelled before iteration {}", cx.node_id(), index);
                return Ok(());
            }
            cx.set_output(Self::OUT_INDEX, index)?;
            cx.trigger(Self::FLOW_ITERATION).await?;
        }

        if cx.is_cancelled() {
            return Ok(());
        }
        cx.trigger(Self::FLOW_FINISHED).await
    }
}
