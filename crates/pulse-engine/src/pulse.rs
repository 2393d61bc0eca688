//! Pulse execution
//!
//! A [`Pulse`] is one activation of a graph: it starts at an entry node, runs
//! flow nodes as they are triggered and pulls values from pure nodes on
//! demand. It owns a value cache keyed by (node, output slot) and the
//! per-node evaluation state, so node instances stay stateless and several
//! pulses can run over the same `&Graph` at once.
//!
//! Value reads follow these rules:
//! - an unconnected input yields the port default
//! - a flow node producer yields its latest written output, or the type
//!   default if it has not run; reads never re-run a flow node
//! - a pure producer is evaluated at most once per pulse and memoized
//! - when a flow node writes an output, the pure nodes downstream of it are
//!   reset so that loop bodies see fresh values
//! - when a variable is written through [`NodeContext::set_variable`], the
//!   pure nodes that read it through [`NodeContext::variable`] are reset,
//!   along with everything downstream of them
//!
//! Flow triggers run their targets in connection order, each to completion
//! before the next. Cancellation is cooperative: a cancelled pulse ignores
//! further triggers, and iterating nodes poll [`NodeContext::is_cancelled`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::connection::PortRef;
use crate::error::{EngineError, Result};
use crate::events::{EventSink, NullEventSink, PulseEvent};
use crate::extensions::ExecutorExtensions;
use crate::graph::Graph;
use crate::node::GraphNode;
use crate::types::{FromValue, NodeId, Value};
use crate::variables::VariableStore;

/// Base type name of the nodes fired by [`Pulse::run_event`]
pub const EVENT_NODE_TYPE: &str = "OnTrigger";

/// Property holding the event name an `OnTrigger` node listens for
pub const EVENT_PROPERTY: &str = "Event";

/// Execution limits for a pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseOptions {
    /// Maximum nesting of flow triggers before the pulse is aborted
    pub max_flow_depth: usize,
}

impl Default for PulseOptions {
    fn default() -> Self {
        Self {
            max_flow_depth: 512,
        }
    }
}

/// Shared cancellation flag of one pulse
#[derive(Debug, Clone, Default)]
pub struct PulseCancellation(Arc<AtomicBool>);

impl PulseCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next trigger or poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a finished pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseReport {
    pub pulse_id: uuid::Uuid,
    /// Number of successful `process` calls
    pub nodes_processed: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvalState {
    Evaluating,
    Resolved,
}

#[derive(Default)]
struct PulseState {
    outputs: HashMap<(NodeId, usize), Value>,
    /// Absent means not visited
    eval: HashMap<NodeId, EvalState>,
    /// Pure nodes that read each variable during this pulse
    variable_readers: HashMap<String, HashSet<NodeId>>,
    nodes_processed: usize,
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// One execution activation over a graph
pub struct Pulse<'g> {
    id: uuid::Uuid,
    graph: &'g Graph,
    payload: Value,
    extensions: Arc<ExecutorExtensions>,
    events: Arc<dyn EventSink>,
    options: PulseOptions,
    cancellation: PulseCancellation,
    state: Mutex<PulseState>,
}

impl<'g> Pulse<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            graph,
            payload: Value::Null,
            extensions: Arc::new(ExecutorExtensions::new()),
            events: Arc::new(NullEventSink),
            options: PulseOptions::default(),
            cancellation: PulseCancellation::new(),
            state: Mutex::new(PulseState::default()),
        }
    }

    /// Data delivered with the external trigger
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Host services available to nodes
    pub fn with_extensions(mut self, extensions: Arc<ExecutorExtensions>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_options(mut self, options: PulseOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing cancellation flag, e.g. one per host request
    pub fn with_cancellation(mut self, cancellation: PulseCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Handle for cancelling this pulse from outside
    pub fn cancellation(&self) -> PulseCancellation {
        self.cancellation.clone()
    }

    /// Run the pulse by triggering `flow_input` on `entry`
    pub async fn run(self, entry: NodeId, flow_input: usize) -> Result<PulseReport> {
        let started = Instant::now();
        self.start(entry, flow_input).await?;
        Ok(self.finish(started))
    }

    /// Run the pulse by firing every `OnTrigger` node listening for `event`,
    /// in graph order
    pub async fn run_event(self, event: &str) -> Result<PulseReport> {
        let started = Instant::now();
        let entries: Vec<NodeId> = self
            .graph
            .nodes()
            .iter()
            .filter(|n| n.node_type == EVENT_NODE_TYPE)
            .filter(|n| matches!(n.property(EVENT_PROPERTY), Some(Value::String(s)) if s == event))
            .map(|n| n.id)
            .collect();

        if entries.is_empty() {
            log::debug!("No {} node listens for event '{}'", EVENT_NODE_TYPE, event);
        }
        for entry in entries {
            if self.cancellation.is_cancelled() {
                break;
            }
            self.start(entry, 0).await?;
        }
        Ok(self.finish(started))
    }

    async fn start(&self, entry: NodeId, flow_input: usize) -> Result<()> {
        self.emit(PulseEvent::PulseStarted {
            pulse_id: self.id,
            entry,
            flow_input,
        });

        let result = match self.graph.node(entry) {
            None => Err(EngineError::UnknownNode(entry)),
            Some(node)
                if !node.layout.flow_inputs.is_empty()
                    && flow_input >= node.layout.flow_inputs.len() =>
            {
                Err(EngineError::failed(format!(
                    "{} has no flow input slot {}",
                    node.type_name, flow_input
                )))
            }
            Some(_) => self.process_node(entry, Some(flow_input), 0).await,
        };

        if let Err(e) = &result {
            log::error!("Pulse {} failed: {}", self.id, e);
            self.emit(PulseEvent::PulseFailed {
                pulse_id: self.id,
                node_id: e.node_id(),
                error: e.to_string(),
            });
        }
        result
    }

    fn finish(&self, started: Instant) -> PulseReport {
        let report = PulseReport {
            pulse_id: self.id,
            nodes_processed: self.state.lock().nodes_processed,
            cancelled: self.cancellation.is_cancelled(),
            elapsed_ms: whole_millis(started.elapsed()),
        };
        self.emit(PulseEvent::PulseCompleted {
            pulse_id: self.id,
            nodes_processed: report.nodes_processed,
            cancelled: report.cancelled,
        });
        log::debug!(
            "Pulse {} finished: {} node(s) in {}ms{}",
            self.id,
            report.nodes_processed,
            report.elapsed_ms,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }

    fn emit(&self, event: PulseEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver pulse event: {}", e);
        }
    }

    fn process_node<'a>(
        &'a self,
        node_id: NodeId,
        triggered_by: Option<usize>,
        depth: usize,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if depth > self.options.max_flow_depth {
                return Err(EngineError::FlowDepthExceeded {
                    node_id,
                    limit: self.options.max_flow_depth,
                });
            }
            let node = self
                .graph
                .node(node_id)
                .ok_or(EngineError::UnknownNode(node_id))?;

            self.emit(PulseEvent::NodeStarted {
                pulse_id: self.id,
                node_id,
                node_type: node.type_name.clone(),
            });
            let cx = NodeContext {
                pulse: self,
                node,
                triggered_by,
                depth,
            };
            node.logic()
                .process(&cx)
                .await
                .map_err(|e| e.in_node(node_id, &node.type_name))?;

            self.state.lock().nodes_processed += 1;
            self.emit(PulseEvent::NodeCompleted {
                pulse_id: self.id,
                node_id,
            });
            Ok(())
        })
    }

    fn read_input<'a>(
        &'a self,
        node: &'a GraphNode,
        slot: usize,
        depth: usize,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let port = node.layout.value_inputs.get(slot).ok_or_else(|| {
                EngineError::failed(format!("{} has no value input slot {}", node.type_name, slot))
            })?;
            let Some(source) = self.graph.value_producer(PortRef::new(node.id, slot)) else {
                return Ok(port.default_value.clone());
            };
            let producer = self
                .graph
                .node(source.node)
                .ok_or(EngineError::UnknownNode(source.node))?;

            if !producer.is_flow_node() {
                self.evaluate(producer, depth).await?;
            }
            let value = self.cached_output(producer, source.slot);
            value.convert(&port.data_type)
        })
    }

    /// Evaluate a pure node unless this pulse already resolved it
    async fn evaluate(&self, node: &GraphNode, depth: usize) -> Result<()> {
        {
            let mut state = self.state.lock();
            match state.eval.get(&node.id) {
                Some(EvalState::Resolved) => return Ok(()),
                Some(EvalState::Evaluating) => {
                    let message = format!("value cycle reached {} again", node.type_name);
                    log::error!("Pulse {}: {} ({})", self.id, message, node.id);
                    return Err(EngineError::GraphExecution {
                        node_id: node.id,
                        message,
                    });
                }
                None => {
                    state.eval.insert(node.id, EvalState::Evaluating);
                }
            }
        }

        let result = self.process_node(node.id, None, depth).await;

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                state.eval.insert(node.id, EvalState::Resolved);
                Ok(())
            }
            Err(e) => {
                state.eval.remove(&node.id);
                Err(e)
            }
        }
    }

    fn cached_output(&self, node: &GraphNode, slot: usize) -> Value {
        if let Some(value) = self.state.lock().outputs.get(&(node.id, slot)) {
            return value.clone();
        }
        node.layout
            .value_outputs
            .get(slot)
            .map(|p| p.data_type.default_value())
            .unwrap_or_default()
    }

    fn write_output(&self, node: &GraphNode, slot: usize, value: Value) -> Result<()> {
        let port = node.layout.value_outputs.get(slot).ok_or_else(|| {
            EngineError::failed(format!("{} has no value output slot {}", node.type_name, slot))
        })?;
        let value = value.convert(&port.data_type)?;

        let mut state = self.state.lock();
        state.outputs.insert((node.id, slot), value);
        if node.is_flow_node() {
            self.reset_downstream(&mut state, node.id);
        }
        Ok(())
    }

    fn read_variable(&self, node: &GraphNode, name: &str) -> Result<Value> {
        if !node.is_flow_node() {
            self.state
                .lock()
                .variable_readers
                .entry(name.to_string())
                .or_default()
                .insert(node.id);
        }
        self.graph.variables().value(name)
    }

    fn write_variable(&self, name: &str, value: Value) -> Result<()> {
        self.graph.variables().set(name, value)?;

        let mut state = self.state.lock();
        let readers = state.variable_readers.remove(name).unwrap_or_default();
        for reader in readers {
            if state.eval.get(&reader) == Some(&EvalState::Resolved) {
                state.eval.remove(&reader);
                self.reset_downstream(&mut state, reader);
            }
        }
        Ok(())
    }

    /// Forget resolved pure nodes that depend on `origin`
    fn reset_downstream(&self, state: &mut PulseState, origin: NodeId) {
        let mut queue: VecDeque<NodeId> = self.graph.value_consumers(origin).iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let pure = self.graph.node(id).is_some_and(|n| !n.is_flow_node());
            if !pure || state.eval.get(&id) != Some(&EvalState::Resolved) {
                continue;
            }
            state.eval.remove(&id);
            queue.extend(self.graph.value_consumers(id).iter().copied());
        }
    }

    fn trigger_output<'a>(
        &'a self,
        node: &'a GraphNode,
        slot: usize,
        depth: usize,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if slot >= node.layout.flow_outputs.len() {
                return Err(EngineError::failed(format!(
                    "{} has no flow output slot {}",
                    node.type_name, slot
                )));
            }
            for target in self.graph.flow_targets(PortRef::new(node.id, slot)) {
                if self.cancellation.is_cancelled() {
                    log::debug!("Pulse {} cancelled, skipping trigger", self.id);
                    break;
                }
                self.process_node(target.node, Some(target.slot), depth + 1)
                    .await?;
            }
            Ok(())
        })
    }
}

/// A node's view of the pulse while its `process` runs
pub struct NodeContext<'a> {
    pulse: &'a Pulse<'a>,
    node: &'a GraphNode,
    triggered_by: Option<usize>,
    depth: usize,
}

impl<'a> NodeContext<'a> {
    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    /// The graph node being processed
    pub fn node(&self) -> &'a GraphNode {
        self.node
    }

    /// Flow input slot that fired, or `None` for a value evaluation
    pub fn triggered_by(&self) -> Option<usize> {
        self.triggered_by
    }

    pub fn pulse_id(&self) -> uuid::Uuid {
        self.pulse.id
    }

    /// Number of value inputs on this instance (variadic nodes vary)
    pub fn value_input_count(&self) -> usize {
        self.node.layout.value_inputs.len()
    }

    /// Read a value input as the port's declared type
    pub async fn input_value(&self, slot: usize) -> Result<Value> {
        self.pulse.read_input(self.node, slot, self.depth).await
    }

    /// Read a value input and extract a Rust value
    pub async fn input<T: FromValue>(&self, slot: usize) -> Result<T> {
        T::from_value(self.input_value(slot).await?)
    }

    /// Write a value output, coerced to the port's declared type
    pub fn set_output(&self, slot: usize, value: impl Into<Value>) -> Result<()> {
        self.pulse.write_output(self.node, slot, value.into())
    }

    /// Run every node connected to a flow output, in connection order.
    /// Does nothing once the pulse is cancelled.
    pub async fn trigger(&self, slot: usize) -> Result<()> {
        if self.pulse.cancellation.is_cancelled() {
            return Ok(());
        }
        self.pulse.trigger_output(self.node, slot, self.depth).await
    }

    /// Read a property and extract a Rust value
    pub fn property<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .node
            .property(name)
            .ok_or_else(|| EngineError::InvalidProperty {
                node_id: self.node.id,
                name: name.to_string(),
                reason: "no such property".to_string(),
            })?;
        T::from_value(value.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.pulse.cancellation.is_cancelled()
    }

    /// Cancel the whole pulse
    pub fn cancel(&self) {
        self.pulse.cancellation.cancel();
    }

    /// Data delivered with the external trigger
    pub fn payload(&self) -> &Value {
        &self.pulse.payload
    }

    /// Read a graph variable. A pure node reading through here is
    /// re-evaluated after the variable is written with
    /// [`set_variable`](Self::set_variable) in the same pulse.
    pub fn variable(&self, name: &str) -> Result<Value> {
        self.pulse.read_variable(self.node, name)
    }

    /// Write a graph variable, coerced to its declared type, and reset the
    /// pure nodes of this pulse that read it
    pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.pulse.write_variable(name, value.into())
    }

    /// Graph variables, shared with other pulses
    pub fn variables(&self) -> &'a VariableStore {
        self.pulse.graph.variables()
    }

    pub fn extensions(&self) -> &ExecutorExtensions {
        &self.pulse.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEventSink;
    use crate::graph::NodeConfig;
    use crate::test_support::{test_registry, Recorder};

    fn connect_value(graph: &mut Graph, from: NodeId, out: usize, to: NodeId, input: usize) {
        graph
            .create_value_connection(PortRef::new(from, out), PortRef::new(to, input))
            .unwrap();
    }

    fn connect_flow(graph: &mut Graph, from: NodeId, out: usize, to: NodeId) {
        graph
            .create_flow_connection(PortRef::new(from, out), PortRef::new(to, 0))
            .unwrap();
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[tokio::test]
    async fn test_unconnected_input_uses_port_default() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let record = graph.add_node(None, "Record").unwrap();

        Pulse::new(&graph).run(record, 0).await.unwrap();
        assert_eq!(recorder.values(), vec![Value::Null]);
    }

    #[tokio::test]
    async fn test_pure_node_memoized_within_pulse() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let number = graph
            .insert_node(NodeConfig::new("Number").with_property("Value", 2))
            .unwrap();
        let sum = graph.add_node(None, "Sum").unwrap();
        let first = graph.add_node(None, "Record").unwrap();
        let second = graph.add_node(None, "Record").unwrap();
        connect_value(&mut graph, number, 0, sum, 0);
        connect_value(&mut graph, number, 0, sum, 1);
        connect_value(&mut graph, sum, 0, first, 0);
        connect_value(&mut graph, sum, 0, second, 0);
        connect_flow(&mut graph, first, 0, second);

        let report = Pulse::new(&graph).run(first, 0).await.unwrap();

        assert_eq!(recorder.values(), vec![Value::Int(4), Value::Int(4)]);
        assert_eq!(recorder.sum_calls(), 1);
        // number, sum, two records
        assert_eq!(report.nodes_processed, 4);
        assert!(!report.cancelled);

        // a new pulse starts with an empty cache
        Pulse::new(&graph).run(first, 0).await.unwrap();
        assert_eq!(recorder.sum_calls(), 2);
    }

    #[tokio::test]
    async fn test_loop_body_sees_fresh_values() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let looped = graph.add_node(None, "Loop").unwrap();
        let ten = graph
            .insert_node(NodeConfig::new("Number").with_property("Value", 10))
            .unwrap();
        let sum = graph.add_node(None, "Sum").unwrap();
        let record = graph.add_node(None, "Record").unwrap();
        connect_value(&mut graph, looped, 0, sum, 0);
        connect_value(&mut graph, ten, 0, sum, 1);
        connect_value(&mut graph, sum, 0, record, 0);
        connect_flow(&mut graph, looped, 0, record);

        let report = Pulse::new(&graph).run(looped, 0).await.unwrap();

        assert_eq!(
            recorder.values(),
            vec![Value::Int(10), Value::Int(11), Value::Int(12)]
        );
        assert_eq!(recorder.sum_calls(), 3);
        // loop, number once, sum three times, record three times
        assert_eq!(report.nodes_processed, 8);
    }

    #[tokio::test]
    async fn test_flow_output_read_before_run_is_type_default() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let looped = graph.add_node(None, "Loop").unwrap();
        let record = graph.add_node(None, "Record").unwrap();
        connect_value(&mut graph, looped, 0, record, 0);

        Pulse::new(&graph).run(record, 0).await.unwrap();
        assert_eq!(recorder.values(), vec![Value::Int(0)]);
    }

    #[tokio::test]
    async fn test_node_error_wrapped_and_reported() {
        init_logging();
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let record = graph.add_node(None, "Record").unwrap();
        let fail = graph.add_node(None, "Fail").unwrap();
        let after = graph.add_node(None, "Record").unwrap();
        connect_flow(&mut graph, record, 0, fail);
        connect_flow(&mut graph, fail, 0, after);

        let sink = Arc::new(VecEventSink::new());
        let err = Pulse::new(&graph)
            .with_event_sink(sink.clone())
            .run(record, 0)
            .await
            .unwrap_err();

        match &err {
            EngineError::NodeProcess { node_id, node_type, source } => {
                assert_eq!(*node_id, fail);
                assert_eq!(node_type, "Fail");
                assert!(matches!(**source, EngineError::ExecutionFailed(_)));
            }
            other => panic!("Expected NodeProcess, got {other:?}"),
        }
        assert_eq!(recorder.values().len(), 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            PulseEvent::PulseFailed { node_id: Some(id), .. } if *id == fail
        )));
    }

    #[tokio::test]
    async fn test_reentry_while_evaluating_is_graph_execution_error() {
        init_logging();
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder));
        let number = graph.add_node(None, "Number").unwrap();
        let record = graph.add_node(None, "Record").unwrap();
        connect_value(&mut graph, number, 0, record, 0);

        let pulse = Pulse::new(&graph);
        pulse.state.lock().eval.insert(number, EvalState::Evaluating);
        let err = pulse.run(record, 0).await.unwrap_err();

        assert!(matches!(err, EngineError::GraphExecution { node_id, .. } if node_id == number));
    }

    #[tokio::test]
    async fn test_cancelled_pulse_ignores_triggers() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let cancel = graph.add_node(None, "Cancel").unwrap();
        let record = graph.add_node(None, "Record").unwrap();
        connect_flow(&mut graph, cancel, 0, record);

        let report = Pulse::new(&graph).run(cancel, 0).await.unwrap();

        assert!(report.cancelled);
        assert!(recorder.values().is_empty());
    }

    #[tokio::test]
    async fn test_flow_cycle_bounded_by_depth() {
        init_logging();
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let a = graph.add_node(None, "Record").unwrap();
        let b = graph.add_node(None, "Record").unwrap();
        connect_flow(&mut graph, a, 0, b);
        connect_flow(&mut graph, b, 0, a);

        let err = Pulse::new(&graph)
            .with_options(PulseOptions { max_flow_depth: 8 })
            .run(a, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::FlowDepthExceeded { limit: 8, .. }));
        assert_eq!(recorder.values().len(), 9);
    }

    #[tokio::test]
    async fn test_run_event_fires_matching_triggers() {
        let recorder = Recorder::default();
        let mut graph = Graph::new(test_registry(recorder.clone()));
        let on_press = graph
            .insert_node(NodeConfig::new("OnTrigger").with_property(EVENT_PROPERTY, "press"))
            .unwrap();
        let on_release = graph
            .insert_node(NodeConfig::new("OnTrigger").with_property(EVENT_PROPERTY, "release"))
            .unwrap();
        let pressed = graph.add_node(None, "Record").unwrap();
        let released = graph.add_node(None, "Record").unwrap();
        connect_flow(&mut graph, on_press, 0, pressed);
        connect_flow(&mut graph, on_release, 0, released);
        connect_value(&mut graph, on_press, 0, pressed, 0);

        let report = Pulse::new(&graph)
            .with_payload("button-a")
            .run_event("press")
            .await
            .unwrap();

        assert_eq!(recorder.values(), vec![Value::from("button-a")]);
        assert_eq!(report.nodes_processed, 2);
    }

    #[tokio::test]
    async fn test_unknown_entry() {
        let graph = Graph::new(test_registry(Recorder::default()));
        let err = Pulse::new(&graph)
            .run(uuid::Uuid::new_v4(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(_)));
    }

    #[test]
    fn test_whole_millis_saturates() {
        assert_eq!(whole_millis(Duration::from_micros(2_500)), 2);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: PulseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.max_flow_depth, 512);
        let options: PulseOptions = serde_json::from_str(r#"{"max_flow_depth": 4}"#).unwrap();
        assert_eq!(options.max_flow_depth, 4);
    }
}
