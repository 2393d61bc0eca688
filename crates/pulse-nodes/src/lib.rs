//! Pulse Nodes
//!
//! Built-in node library for the pulse engine. Every node submits its
//! registration with `inventory`, so linking this crate is enough for
//! `NodeRegistry::with_builtins()` to find them.
//!
//! # Categories
//!
//! - **Event**: `OnTrigger`, the entry point for external events
//! - **Data**: `Constant<T>`, `CreateList<T>`
//! - **Math**: `Add<T>`, `Compare<T>`
//! - **Control**: `Branch`, `Repeat`, `ForEach<T>`
//! - **Variable**: `GetVariable<T>`, `SetVariable<T>`
//! - **Output**: `Print`, which writes to a host-supplied [`PrintSink`]

pub mod control;
pub mod data;
pub mod event;
pub mod math;
pub mod output;
pub mod variable;

pub use control::*;
pub use data::*;
pub use event::*;
pub use math::*;
pub use output::*;
pub use variable::*;
