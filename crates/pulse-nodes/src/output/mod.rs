//! Output nodes
//!
//! Nodes that hand results to the host application.

mod print;

pub use print::{CollectingPrintSink, PrintNode, PrintSink};
