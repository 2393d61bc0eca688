//! On Trigger Node
//!
//! Entry point for external events. `Pulse::run_event` fires every
//! `OnTrigger` node whose `Event` property matches the event name.

use async_trait::async_trait;
use pulse_engine::pulse::{EVENT_NODE_TYPE, EVENT_PROPERTY};
use pulse_engine::{
    FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeMetadata,
    NodeRegistration, PropertyMetadata, Result, ValuePortMetadata,
};

/// On Trigger Node
///
/// # Properties
/// - `Event` - Name of the event this node listens for
///
/// # Outputs
/// - `Fired` (flow) - Triggered once per matching event
/// - `Payload` - Data delivered with the event
pub struct OnTriggerNode;

impl OnTriggerNode {
    pub const FLOW_FIRED: usize = 0;
    pub const OUT_PAYLOAD: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for OnTriggerNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new(EVENT_NODE_TYPE, NodeCategory::Event, "On Trigger")
            .with_description("Starts a pulse when a named event arrives")
            .property(PropertyMetadata::new(EVENT_PROPERTY, "Event", "String"))
            .flow_output(FlowPortMetadata::new("Fired", "Fired"))
            .value_output(ValuePortMetadata::optional("Payload", "Payload", "Any"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(OnTriggerNode::registration));

#[async_trait]
impl Node for OnTriggerNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        log::debug!("OnTrigger {}: fired for pulse {}", cx.node_id(), cx.pulse_id());
        cx.set_output(Self::OUT_PAYLOAD, cx.payload().clone())?;
        cx.trigger(Self::FLOW_FIRED).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::output::CollectingPrintSink;
    use crate::test_utils::print_extensions;
    use pulse_engine::{GraphBuilder, NodeRegistry, Pulse, Value};

    #[test]
    fn test_descriptor() {
        let meta = OnTriggerNode::descriptor();
        assert_eq!(meta.node_type, "OnTrigger");
        assert_eq!(meta.category, NodeCategory::Event);
        assert!(meta.flow_inputs.is_empty());
        assert!(meta.is_flow_node());
    }

    #[tokio::test]
    async fn test_payload_reaches_listeners_of_matching_event() {
        let built = GraphBuilder::new(Arc::new(NodeRegistry::with_builtins()))
            .add_node("tick", "OnTrigger")
            .with_property("Event", "tick")
            .add_node("tock", "OnTrigger")
            .with_property("Event", "tock")
            .add_node("print_tick", "Print")
            .add_node("print_tock", "Print")
            .flow("tick", "Fired", "print_tick", "In")
            .value("tick", "Payload", "print_tick", "Value")
            .flow("tock", "Fired", "print_tock", "In")
            .value("tock", "Payload", "print_tock", "Value")
            .build()
            .unwrap();

        let sink = Arc::new(CollectingPrintSink::new());
        Pulse::new(&built.graph)
            .with_payload("hello")
            .with_extensions(print_extensions(sink.clone()))
            .run_event("tick")
            .await
            .unwrap();

        assert_eq!(sink.values(), vec![Value::from("hello")]);
        assert_eq!(sink.lines()[0].0, built.id("print_tick").unwrap());
    }
}
