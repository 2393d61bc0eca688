//! Print Node
//!
//! Emits a value to the host. Hosts that want the output insert an
//! `Arc<dyn PrintSink>` under [`extension_keys::PRINT_SINK`]; without one the
//! value goes to the log.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_engine::{
    extension_keys, FlowPortMetadata, Node, NodeCategory, NodeContext, NodeDescriptor, NodeId,
    NodeMetadata, NodeRegistration, Result, Value, ValuePortMetadata,
};

/// Receiver for values emitted by Print nodes
pub trait PrintSink: Send + Sync {
    fn print(&self, node_id: NodeId, value: &Value);
}

/// Print sink that keeps everything it receives
#[derive(Default)]
pub struct CollectingPrintSink {
    lines: Mutex<Vec<(NodeId, Value)>>,
}

impl CollectingPrintSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printed values with the node that printed them, in order
    pub fn lines(&self) -> Vec<(NodeId, Value)> {
        self.lines.lock().clone()
    }

    /// Printed values only
    pub fn values(&self) -> Vec<Value> {
        self.lines.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl PrintSink for CollectingPrintSink {
    fn print(&self, node_id: NodeId, value: &Value) {
        self.lines.lock().push((node_id, value.clone()));
    }
}

/// Print Node
///
/// # Inputs
/// - `In` (flow)
/// - `Value` - Anything printable
///
/// # Outputs
/// - `Out` (flow) - Triggered after printing
pub struct PrintNode;

impl PrintNode {
    pub const IN_VALUE: usize = 0;
    pub const FLOW_OUT: usize = 0;

    pub fn registration() -> NodeRegistration {
        NodeRegistration::shared(Self::descriptor(), Self)
    }
}

impl NodeDescriptor for PrintNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata::new("Print", NodeCategory::Output, "Print")
            .with_description("Sends a value to the host's print sink")
            .flow_input(FlowPortMetadata::new("In", "In"))
            .flow_output(FlowPortMetadata::new("Out", "Out"))
            .value_input(ValuePortMetadata::optional("Value", "Value", "Any"))
    }
}

inventory::submit!(pulse_engine::RegistrationFn(PrintNode::registration));

#[async_trait]
impl Node for PrintNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let value = cx.input_value(Self::IN_VALUE).await?;

        match cx
            .extensions()
            .get::<Arc<dyn PrintSink>>(extension_keys::PRINT_SINK)
        {
            Some(sink) => sink.print(cx.node_id(), &value),
            None => log::info!("Print {}: {}", cx.node_id(), value),
        }

        cx.trigger(Self::FLOW_OUT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::print_extensions;
    use pulse_engine::{Graph, NodeRegistry, PortRef, Pulse};

    #[tokio::test]
    async fn test_prints_chain_in_order() {
        let mut graph = Graph::new(Arc::new(NodeRegistry::with_builtins()));
        let first = graph.add_node(None, "Print").unwrap();
        let second = graph.add_node(None, "Print").unwrap();
        let text = graph.add_node(None, "Constant<String>").unwrap();
        graph.set_property(text, "Value", "hi").unwrap();
        graph
            .create_flow_connection(PortRef::new(first, 0), PortRef::new(second, 0))
            .unwrap();
        graph
            .create_value_connection(PortRef::new(text, 0), PortRef::new(second, 0))
            .unwrap();

        let sink = Arc::new(CollectingPrintSink::new());
        Pulse::new(&graph)
            .with_extensions(print_extensions(sink.clone()))
            .run(first, 0)
            .await
            .unwrap();

        assert_eq!(
            sink.lines(),
            vec![(first, Value::Null), (second, Value::from("hi"))]
        );
    }

    #[tokio::test]
    async fn test_without_sink_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut graph = Graph::new(Arc::new(NodeRegistry::with_builtins()));
        let print = graph.add_node(None, "Print").unwrap();

        let report = Pulse::new(&graph).run(print, 0).await.unwrap();
        assert_eq!(report.nodes_processed, 1);
    }
}
