//! The shared search tree.
//!
//! One concurrent map from position to node. The map shards internally,
//! so disjoint subtrees insert and look up in parallel; per-node
//! mutation is serialized by each node's own lock, not by the map.

use std::sync::Arc;

use dashmap::DashMap;

use xq_core::Board;

use crate::node::SearchNode;

/// Concurrent position-keyed node store.
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: DashMap<Board, Arc<SearchNode>>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, board: &Board) -> Option<Arc<SearchNode>> {
        self.nodes.get(board).map(|entry| entry.value().clone())
    }

    /// Insert a node for `board`, keeping the existing node if another
    /// worker raced the insertion. Returns the node that ended up in
    /// the tree.
    pub fn insert(&self, board: Board, node: Arc<SearchNode>) -> Arc<SearchNode> {
        self.nodes.entry(board).or_insert(node).value().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node. Used when a move request declines tree reuse
    /// and when the engine closes.
    pub fn clear(&self) {
        self.nodes.clear();
    }
}
