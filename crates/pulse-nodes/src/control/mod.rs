//! Control nodes
//!
//! Branches and loops.

mod branch;
mod for_each;
mod repeat;

pub use branch::BranchNode;
pub use for_each::ForEachNode;
pub use repeat::RepeatNode;
