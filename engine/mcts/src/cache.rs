//! Bounded transposition cache.
//!
//! Maps Zobrist fingerprints to shared search nodes. The cache is
//! advisory: entries may go stale when the tree is replaced between
//! moves, and a lookup against a stale entry is merely wasted work
//! because the node stays self-consistent. Eviction is approximate
//! low-value removal rather than true LRU, trading precision for a
//! single scan per overflowing insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::node::SearchNode;

/// Fingerprint-keyed cache of shared nodes with bounded capacity.
#[derive(Debug)]
pub struct TranspositionCache {
    capacity: usize,
    entries: Mutex<HashMap<u64, Arc<SearchNode>>>,
}

impl TranspositionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::with_capacity(capacity.min(4096))),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<SearchNode>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Look up a node by fingerprint.
    pub fn get(&self, hash: u64) -> Option<Arc<SearchNode>> {
        self.guard().get(&hash).cloned()
    }

    /// Insert a node, evicting low-visit entries first if the cache is
    /// at capacity. Among the entries tied at the minimum visit count,
    /// at most half (at least one) are removed per insertion.
    pub fn put(&self, hash: u64, node: Arc<SearchNode>) {
        let mut entries = self.guard();
        if !entries.contains_key(&hash) && entries.len() >= self.capacity {
            let min = entries
                .values()
                .map(|n| n.visits())
                .min()
                .unwrap_or_default();
            let tied: Vec<u64> = entries
                .iter()
                .filter(|(_, n)| n.visits() == min)
                .map(|(&k, _)| k)
                .collect();
            let evict = (tied.len() / 2).max(1);
            for key in tied.into_iter().take(evict) {
                entries.remove(&key);
            }
            trace!(evicted = evict, min_visits = min, "transposition cache eviction");
        }
        entries.insert(hash, node);
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_visits(fingerprint: u64, visits: u32) -> Arc<SearchNode> {
        let node = Arc::new(SearchNode::new(fingerprint, Vec::new()));
        // A fresh node starts at one visit.
        for _ in 1..visits {
            node.record_visit();
        }
        node
    }

    #[test]
    fn test_get_put_round_trip() {
        let cache = TranspositionCache::new(8);
        let node = node_with_visits(1, 1);
        cache.put(1, node.clone());
        assert!(Arc::ptr_eq(&cache.get(1).unwrap(), &node));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let cache = TranspositionCache::new(4);
        for i in 0..32u64 {
            cache.put(i, node_with_visits(i, (i % 5 + 1) as u32));
            assert!(cache.len() <= 4);
        }
    }

    #[test]
    fn test_eviction_targets_minimum_visits() {
        let cache = TranspositionCache::new(3);
        cache.put(1, node_with_visits(1, 50));
        cache.put(2, node_with_visits(2, 50));
        cache.put(3, node_with_visits(3, 1));

        cache.put(4, node_with_visits(4, 10));

        // Only the single minimum-visit entry is gone.
        assert!(cache.get(3).is_none());
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_some());
        assert!(cache.get(4).is_some());
    }

    #[test]
    fn test_eviction_removes_at_most_half_the_tied_set() {
        let cache = TranspositionCache::new(4);
        for i in 0..4u64 {
            cache.put(i, node_with_visits(i, 1));
        }
        cache.put(99, node_with_visits(99, 1));

        // Four entries tied at the minimum, two evicted, one inserted.
        assert_eq!(cache.len(), 3);
        assert!(cache.get(99).is_some());
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache = TranspositionCache::new(2);
        cache.put(1, node_with_visits(1, 5));
        cache.put(2, node_with_visits(2, 5));
        cache.put(1, node_with_visits(1, 9));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(2).is_some());
    }
}
