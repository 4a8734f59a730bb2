//! Per-position and per-move search statistics.
//!
//! A [`SearchNode`] exists once per distinct position. All per-move
//! state lives behind the node's mutex; only the visit total is kept
//! outside it as an atomic so the cache's eviction scan can read it
//! without taking node locks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use xq_core::{Board, Move};

/// One step of a simulation's root-to-leaf path: the position the step
/// started from, the move selected there, and the virtual loss that
/// was applied to the chosen edge. The loss is carried so backup can
/// reverse exactly what was borrowed.
#[derive(Debug, Clone)]
pub struct PathStep {
    pub board: Board,
    pub mv: Move,
    pub loss: f32,
}

/// A simulation suspended on a node that is still awaiting its
/// external evaluation. Re-enqueued as a fresh simulation from that
/// node once the evaluation resolves.
pub type Continuation = Vec<PathStep>;

/// Statistics for one legal move out of a node.
#[derive(Debug, Clone, Default)]
pub struct EdgeStats {
    /// Visit count. Fractionally inflated while virtual loss is
    /// outstanding; every inflation is reversed exactly once on backup.
    pub n: f32,
    /// Accumulated value.
    pub w: f32,
    /// Mean value, `w / n` whenever `n > 0`.
    pub q: f32,
    /// Running variance estimate for UCB1-TUNED.
    pub q_variance: f32,
    /// Prior probability from the node's evaluated policy.
    pub prior: f32,
    /// RAVE (all-moves-as-first) visit count.
    pub rave_n: u32,
    /// RAVE accumulated value.
    pub rave_w: f32,
    /// RAVE mean value.
    pub rave_q: f32,
}

impl EdgeStats {
    /// Dynamic virtual loss for this edge: grows with the share of the
    /// node's visits already routed here, and with how uncertain or
    /// middling the edge's value still is.
    pub fn dynamic_loss(&self, base: f32, ratio_weight: f32, node_visits: u32) -> f32 {
        let visit_ratio = self.n / node_visits.max(1) as f32;
        base * (1.0 + visit_ratio * ratio_weight) + (0.5 - self.q).max(0.0) * 2.0
    }

    /// Borrow a virtual loss while a simulation is in flight through
    /// this edge.
    pub fn apply_loss(&mut self, loss: f32) {
        self.n += loss;
        self.w -= loss;
        self.q = self.w / self.n;
    }

    /// Repay the borrowed loss and apply the confirmed visit, then
    /// fold the new mean into the running variance estimate.
    pub fn confirm(&mut self, value: f32, loss: f32) {
        self.n += 1.0 - loss;
        self.w += value + loss;
        let old_q = self.q;
        self.q = self.w / self.n;
        let delta = self.q - old_q;
        self.q_variance += delta * delta;
        self.q_variance *= (self.n - 1.0) / self.n;
    }

    /// Credit this move with a value observed anywhere later in a
    /// simulated path (AMAF).
    pub fn rave_update(&mut self, value: f32) {
        self.rave_n += 1;
        self.rave_w += value;
        self.rave_q = self.rave_w / self.rave_n as f32;
    }
}

/// Mutable node state, guarded by the node's mutex.
#[derive(Debug)]
pub struct NodeState {
    /// Per-move statistics, keyed by legal move.
    pub edges: HashMap<Move, EdgeStats>,
    /// Legal moves fixed at node creation, in generation order. Also
    /// the alignment order for evaluated policies.
    pub legal_moves: Vec<Move>,
    /// True between node creation and arrival of its evaluation. While
    /// set, simulations landing here queue instead of selecting.
    pub pending: bool,
    /// Simulations suspended on this node's pending evaluation.
    pub queued: Vec<Continuation>,
}

/// One position in the shared search tree.
#[derive(Debug)]
pub struct SearchNode {
    fingerprint: u64,
    visits: AtomicU32,
    state: Mutex<NodeState>,
}

impl SearchNode {
    /// Create a node in its pending state. The creation itself counts
    /// as the first visit.
    pub fn new(fingerprint: u64, legal_moves: Vec<Move>) -> Self {
        let edges = legal_moves
            .iter()
            .map(|&mv| (mv, EdgeStats::default()))
            .collect();
        Self {
            fingerprint,
            visits: AtomicU32::new(1),
            state: Mutex::new(NodeState {
                edges,
                legal_moves,
                pending: true,
                queued: Vec::new(),
            }),
        }
    }

    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Total simulations routed through this node. Lock-free read.
    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    /// Count one more simulation routed through this node.
    #[inline]
    pub fn record_visit(&self) {
        self.visits.fetch_add(1, Ordering::Relaxed);
    }

    /// Lock the node's mutable state.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, NodeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Whether the node is still awaiting its evaluation. Takes the
    /// lock briefly.
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_borrow_and_confirm_restore_invariants() {
        let mut edge = EdgeStats::default();

        let loss = edge.dynamic_loss(3.0, 0.5, 10);
        // Unvisited neutral edge: base * 1.0 plus the full uncertainty
        // term for q = 0.
        assert!((loss - 4.0).abs() < 1e-6);

        edge.apply_loss(loss);
        assert!((edge.n - loss).abs() < 1e-6);
        assert!((edge.w + loss).abs() < 1e-6);

        edge.confirm(0.5, loss);
        assert!((edge.n - 1.0).abs() < 1e-5);
        assert!((edge.w - 0.5).abs() < 1e-5);
        assert!((edge.q - edge.w / edge.n).abs() < 1e-6);
    }

    #[test]
    fn test_confirm_accumulates() {
        let mut edge = EdgeStats::default();
        for value in [1.0, -1.0, 1.0, 1.0] {
            let loss = edge.dynamic_loss(3.0, 0.5, 5);
            edge.apply_loss(loss);
            edge.confirm(value, loss);
        }
        assert!((edge.n - 4.0).abs() < 1e-4);
        assert!((edge.w - 2.0).abs() < 1e-4);
        assert!((edge.q - 0.5).abs() < 1e-4);
        assert!(edge.q_variance >= 0.0);
    }

    #[test]
    fn test_rave_update() {
        let mut edge = EdgeStats::default();
        edge.rave_update(1.0);
        edge.rave_update(0.0);
        assert_eq!(edge.rave_n, 2);
        assert!((edge.rave_q - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dynamic_loss_grows_with_congestion() {
        let mut edge = EdgeStats::default();
        let idle = edge.dynamic_loss(3.0, 0.5, 100);
        edge.n = 50.0;
        let busy = edge.dynamic_loss(3.0, 0.5, 100);
        // Half the node's visits already piled onto this edge raises
        // the loss for the next taker.
        assert!(busy > idle);

        // A confirmed-good edge sheds the uncertainty term.
        edge.q = 0.9;
        let confident = edge.dynamic_loss(3.0, 0.5, 100);
        assert!(confident < busy);
    }

    #[test]
    fn test_new_node_is_pending_with_one_visit() {
        let moves: Vec<Move> = vec!["a0a1".parse().unwrap(), "i0i1".parse().unwrap()];
        let node = SearchNode::new(7, moves.clone());
        assert_eq!(node.visits(), 1);
        assert!(node.is_pending());
        assert_eq!(node.fingerprint(), 7);

        let state = node.lock();
        assert_eq!(state.legal_moves, moves);
        assert_eq!(state.edges.len(), 2);
        assert!(state.queued.is_empty());
    }
}
