//! Math nodes
//!
//! Arithmetic and comparison.

mod add;
mod compare;

pub use add::AddNode;
pub use compare::CompareNode;
