//! Event nodes
//!
//! Entry points that start a pulse.

mod on_trigger;

pub use on_trigger::OnTriggerNode;
