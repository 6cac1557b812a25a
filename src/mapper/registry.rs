//! Deduplication of `_tree` bookkeeping per (node, parent) pair.

use crate::mapper::types::NodeId;
use dashmap::DashSet;

/// Concurrent set of (node, parent) pairs that already have a `_tree` leaf.
///
/// One registry may be shared by several mappers through an `Arc`.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: DashSet<(NodeId, Option<NodeId>)>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, id: &NodeId, parent: Option<&NodeId>) -> bool {
        self.nodes.contains(&(id.clone(), parent.cloned()))
    }

    pub fn add_node(&self, id: &NodeId, parent: Option<&NodeId>) {
        self.nodes.insert((id.clone(), parent.cloned()));
    }

    /// Check and insert in one step; true when the pair was not seen before
    pub fn register(&self, id: &NodeId, parent: Option<&NodeId>) -> bool {
        self.nodes.insert((id.clone(), parent.cloned()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
