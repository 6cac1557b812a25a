//! Consumers of the leaf sequence: bulk-load script, JSON Lines and graph.

pub mod copy;
pub mod graph;
pub mod jsonl;

pub use copy::CopyWriter;
pub use graph::Graph;
pub use jsonl::JsonLinesWriter;
