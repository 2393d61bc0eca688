//! Small node library used by the engine's unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::descriptor::{
    FlowPortMetadata, NodeCategory, NodeMetadata, PropertyMetadata, ValuePortMetadata,
};
use crate::error::{EngineError, Result};
use crate::node::Node;
use crate::pulse::NodeContext;
use crate::registry::{NodeRegistration, NodeRegistry};
use crate::types::Value;

/// Shared observation points for test nodes
#[derive(Clone, Default)]
pub struct Recorder {
    values: Arc<Mutex<Vec<Value>>>,
    sum_calls: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn values(&self) -> Vec<Value> {
        self.values.lock().clone()
    }

    pub fn sum_calls(&self) -> usize {
        self.sum_calls.load(Ordering::SeqCst)
    }
}

/// Pure: outputs its `Value` property
struct NumberNode;

#[async_trait]
impl Node for NumberNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        cx.set_output(0, cx.property::<i64>("Value")?)
    }
}

/// Pure: adds two ints and counts its invocations
struct SumNode(Recorder);

#[async_trait]
impl Node for SumNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        self.0.sum_calls.fetch_add(1, Ordering::SeqCst);
        let a: i64 = cx.input(0).await?;
        let b: i64 = cx.input(1).await?;
        cx.set_output(0, a + b)
    }
}

/// Pure: passes its input through
struct EchoNode;

#[async_trait]
impl Node for EchoNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        cx.set_output(0, cx.input_value(0).await?)
    }
}

/// Pure: collects its variadic inputs into a list
struct GatherNode;

#[async_trait]
impl Node for GatherNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let mut items = Vec::with_capacity(cx.value_input_count());
        for slot in 0..cx.value_input_count() {
            items.push(cx.input_value(slot).await?);
        }
        cx.set_output(0, items)
    }
}

/// Flow: records its input, then triggers `Out`
struct RecordNode(Recorder);

#[async_trait]
impl Node for RecordNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let value = cx.input_value(0).await?;
        self.0.values.lock().push(value);
        cx.trigger(0).await
    }
}

/// Flow: triggers `Body` `Count` times with `Index`, then `Done`
struct LoopNode;

#[async_trait]
impl Node for LoopNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        let count: i64 = cx.input(0).await?;
        for index in 0..count {
            if cx.is_cancelled() {
                return Ok(());
            }
            cx.set_output(0, index)?;
            cx.trigger(0).await?;
        }
        cx.trigger(1).await
    }
}

struct FailNode;

#[async_trait]
impl Node for FailNode {
    async fn process(&self, _cx: &NodeContext<'_>) -> Result<()> {
        Err(EngineError::failed("boom"))
    }
}

/// Flow: cancels the pulse, then tries to trigger `Out`
struct CancelNode;

#[async_trait]
impl Node for CancelNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        cx.cancel();
        cx.trigger(0).await
    }
}

/// Flow entry: outputs the payload and triggers `Fired`
struct TriggerNode;

#[async_trait]
impl Node for TriggerNode {
    async fn process(&self, cx: &NodeContext<'_>) -> Result<()> {
        cx.set_output(0, cx.payload().clone())?;
        cx.trigger(0).await
    }
}

fn flow_through(node_type: &str) -> NodeMetadata {
    NodeMetadata::new(node_type, NodeCategory::Control, node_type)
        .flow_input(FlowPortMetadata::new("In", "In"))
        .flow_output(FlowPortMetadata::new("Out", "Out"))
}

/// Registry with the test node types
pub fn test_registry(recorder: Recorder) -> Arc<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("Number", NodeCategory::Data, "Number")
            .property(PropertyMetadata::new("Value", "Value", "Int"))
            .value_output(ValuePortMetadata::optional("Value", "Value", "Int")),
        NumberNode,
    ));
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("Sum", NodeCategory::Math, "Sum")
            .value_input(ValuePortMetadata::optional("A", "A", "Int"))
            .value_input(ValuePortMetadata::optional("B", "B", "Int"))
            .value_output(ValuePortMetadata::optional("Sum", "Sum", "Int")),
        SumNode(recorder.clone()),
    ));
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("Echo", NodeCategory::Data, "Echo")
            .generic("T")
            .value_input(ValuePortMetadata::optional("In", "In", "T"))
            .value_output(ValuePortMetadata::optional("Out", "Out", "T")),
        EchoNode,
    ));
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("Gather", NodeCategory::Data, "Gather")
            .value_input(ValuePortMetadata::optional("Item", "Item", "Int").variadic())
            .value_output(ValuePortMetadata::optional("List", "List", "List<Int>")),
        GatherNode,
    ));
    registry.add(NodeRegistration::shared(
        flow_through("Record").value_input(ValuePortMetadata::optional("Value", "Value", "Any")),
        RecordNode(recorder),
    ));
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("Loop", NodeCategory::Control, "Loop")
            .flow_input(FlowPortMetadata::new("Start", "Start"))
            .flow_output(FlowPortMetadata::new("Body", "Body"))
            .flow_output(FlowPortMetadata::new("Done", "Done"))
            .value_input(
                ValuePortMetadata::optional("Count", "Count", "Int")
                    .with_default(serde_json::json!(3)),
            )
            .value_output(ValuePortMetadata::optional("Index", "Index", "Int")),
        LoopNode,
    ));
    registry.add(NodeRegistration::shared(flow_through("Fail"), FailNode));
    registry.add(NodeRegistration::shared(flow_through("Cancel"), CancelNode));
    registry.add(NodeRegistration::shared(
        NodeMetadata::new("OnTrigger", NodeCategory::Event, "On Trigger")
            .property(PropertyMetadata::new("Event", "Event", "String"))
            .flow_output(FlowPortMetadata::new("Fired", "Fired"))
            .value_output(ValuePortMetadata::optional("Payload", "Payload", "Any")),
        TriggerNode,
    ));
    Arc::new(registry)
}
