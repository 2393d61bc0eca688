//! Branch Node
//!
//! Routes the pulse to `True` or `False` based on a boolean condition.

use async_trait::async_trait;
use pulse_engine::{
    FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, Result, ValuePortMetadata,
};

/// Branch Node
///
/// # Inputs
/// - `In` (flow)
/// - `Condition` (Bool, required)
///
/// # Outputs
/// - `True` (flow) - Triggered when the condition holds
/// - `False` (flow) - Triggered otherwise
pub struct BranchNode;

impl BranchNode {
    pub const IN_CONDITION: usize = 0;
    pub const FLOW_TRUE: usize = 0;
    pub const FLOW_FALSE: usize = 1;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for BranchNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Branch", NodeCategory::Control, "Branch")
            .with_description("Continues through True or False")
            .flow_input(FlowPortMetadata::new("In", "In"))
            .flow_output(FlowPortMetadata::new("True", "True"))
            .flow_output(FlowPortMetadata::new("False", "False"))
            .value_input(ValuePortMetadata::required("Condition", "Condition", "Bool"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(BranchNode::registration));

#[async_trait]
impl Node for BranchNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let condition: bool = cx.input(Self::IN_CONDITION).await?;
        log::debug!("Branch {}: condition={}", cx.node_id(), condition);

        if condition {
            cx.trigger(Self::FLOW_TRUE).await
        } else {
            cx.trigger(Self::FLOW_FALSE).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::output::CollectingPrintSink;
    use crate::test_utils::print_extensions;
    use pulse_engine::{GraphBuilder, NodeRegistry, Pulse};

    async fn run_branch(left: i64, right: i64) -> Vec<&'static str> {
        let built = GraphBuilder::new(Arc::new(NodeRegistry::with_builtins()))
            .add_node("a", "Constant<Int>")
            .with_property("Value", left)
            .add_node("b", "Constant<Int>")
            .with_property("Value", right)
            .add_node("less", "Compare<Int>")
            .with_property("Operator", "<")
            .add_node("branch", "Branch")
            .add_node("yes", "Print")
            .add_node("no", "Print")
            .value("a", "Value", "less", "A")
            .value("b", "Value", "less", "B")
            .value("less", "Result", "branch", "Condition")
            .flow("branch", "True", "yes", "In")
            .flow("branch", "False", "no", "In")
            .build()
            .unwrap();

        let sink = Arc::new(CollectingPrintSink::new());
        Pulse::new(&built.graph)
            .with_extensions(print_extensions(sink.clone()))
            .run(built.id("branch").unwrap(), 0)
            .await
            .unwrap();

        sink.lines()
            .into_iter()
            .map(|(id, _)| if Some(id) == built.id("yes") { "yes" } else { "no" })
            .collect()
    }

    #[tokio::test]
    async fn test_routes_on_condition() {
        assert_eq!(run_branch(1, 2).await, vec!["yes"]);
        assert_eq!(run_branch(2, 1).await, vec!["no"]);
    }
}
