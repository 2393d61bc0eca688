//! Data nodes
//!
//! Constants and collection construction.

mod constant;
mod create_list;

pub use constant::ConstantNode;
pub use create_list::CreateListNode;
