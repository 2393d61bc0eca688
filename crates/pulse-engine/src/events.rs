//! Events reported while a pulse runs
//!
//! Pulses report their progress to an [`EventSink`]. The sink abstracts the
//! transport so hosts can forward events to an editor, a channel or a log.
//! Sink errors are logged and otherwise ignored; they never fail a pulse.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NodeId;

/// Receiver of pulse events
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: PulseEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone, Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted during a pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PulseEvent {
    /// The pulse began at an entry node
    #[serde(rename_all = "camelCase")]
    PulseStarted {
        pulse_id: uuid::Uuid,
        entry: NodeId,
        flow_input: usize,
    },

    /// A node's logic is about to run
    #[serde(rename_all = "camelCase")]
    NodeStarted {
        pulse_id: uuid::Uuid,
        node_id: NodeId,
        node_type: String,
    },

    /// A node's logic returned successfully
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        pulse_id: uuid::Uuid,
        node_id: NodeId,
    },

    /// The pulse finished, possibly after cancellation
    #[serde(rename_all = "camelCase")]
    PulseCompleted {
        pulse_id: uuid::Uuid,
        nodes_processed: usize,
        cancelled: bool,
    },

    /// The pulse was aborted by an error
    #[serde(rename_all = "camelCase")]
    PulseFailed {
        pulse_id: uuid::Uuid,
        node_id: Option<NodeId>,
        error: String,
    },
}

impl PulseEvent {
    /// The pulse this event belongs to
    pub fn pulse_id(&self) -> uuid::Uuid {
        match self {
            Self::PulseStarted { pulse_id, .. }
            | Self::NodeStarted { pulse_id, .. }
            | Self::NodeCompleted { pulse_id, .. }
            | Self::PulseCompleted { pulse_id, .. }
            | Self::PulseFailed { pulse_id, .. } => *pulse_id,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: PulseEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<PulseEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<PulseEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: PulseEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Forwards events to a tokio channel, for hosts that stream pulse progress
pub struct ChannelEventSink {
    sender: tokio::sync::mpsc::UnboundedSender<PulseEvent>,
}

impl ChannelEventSink {
    pub fn new(sender: tokio::sync::mpsc::UnboundedSender<PulseEvent>) -> Self {
        Self { sender }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, tokio::sync::mpsc::UnboundedReceiver<PulseEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: PulseEvent) -> Result<(), EventError> {
        self.sender
            .send(event)
            .map_err(|_| EventError::channel_closed())
    }
}
