//! Edge selection policy.
//!
//! Pure function of node state: UCB1-TUNED scores blended with RAVE,
//! gated by progressive unlock, with Dirichlet exploration noise mixed
//! in at the root only. Ties break on legal-move generation order.

use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};

use xq_core::{Board, Move};

use crate::config::SearchConfig;
use crate::node::NodeState;

/// Estimated complexity of a candidate move, used to gate it behind a
/// visit threshold (progressive unlock). The search only ever compares
/// `complexity * unlock_multiplier` against the node's visit total.
pub trait MoveComplexity: Send + Sync {
    fn complexity(&self, board: &Board, mv: Move) -> f32;
}

/// Constant complexity of 1 for every move, which makes the unlock
/// gate a single global visit threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformComplexity;

impl MoveComplexity for UniformComplexity {
    fn complexity(&self, _board: &Board, _mv: Move) -> f32 {
        1.0
    }
}

/// Pick one legal move out of `state`, or `None` when no candidate
/// remains (terminal or fully excluded).
///
/// Root-only behavior: `excluded` moves are skipped entirely and
/// Dirichlet noise is sampled fresh per call and blended into each
/// candidate's score.
#[allow(clippy::too_many_arguments)]
pub fn select_move(
    board: &Board,
    state: &NodeState,
    node_visits: u32,
    config: &SearchConfig,
    is_root: bool,
    excluded: &[Move],
    complexity: &dyn MoveComplexity,
    rng: &mut ChaCha20Rng,
) -> Option<Move> {
    let candidates: Vec<Move> = state
        .legal_moves
        .iter()
        .copied()
        .filter(|mv| !(is_root && excluded.contains(mv)))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let visits = node_visits.max(1) as f32;
    let unlocked: Vec<bool> = candidates
        .iter()
        .map(|&mv| visits >= complexity.complexity(board, mv) * config.unlock_multiplier)
        .collect();
    // If the gate would lock every candidate, ignore it; it exists to
    // stage move introduction, not to stall the search.
    let gate_active = unlocked.iter().any(|&u| u);

    let noise = if is_root && config.noise_epsilon > 0.0 {
        Some(dirichlet_noise(
            candidates.len(),
            config.dirichlet_alpha,
            rng,
        ))
    } else {
        None
    };

    let beta = (config.rave_k / (3.0 * visits + config.rave_k)).sqrt();

    let mut best: Option<(Move, f32)> = None;
    for (i, &mv) in candidates.iter().enumerate() {
        if gate_active && !unlocked[i] {
            continue;
        }
        let edge = match state.edges.get(&mv) {
            Some(edge) => edge,
            None => continue,
        };

        let mut score = if edge.n <= 0.0 {
            // Untried edges are taken before any exploitation begins.
            f32::INFINITY
        } else {
            let exploration = config.exploration * (2.0 * visits.ln() / edge.n).sqrt();
            let variance_bound = config.variance_bound.min(edge.q_variance + exploration);
            let ucb_tuned = edge.q + exploration * variance_bound;
            if config.rave_enabled {
                let rave = if edge.rave_n > 0 { edge.rave_q } else { 0.0 };
                (1.0 - beta) * ucb_tuned + beta * rave
            } else {
                ucb_tuned
            }
        };

        if gate_active && unlocked[i] {
            score += config.unlock_bonus;
        }
        if let Some(noise) = &noise {
            if score.is_finite() {
                score = (1.0 - config.noise_epsilon) * score + config.noise_epsilon * noise[i];
            }
        }

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((mv, score)),
        }
    }
    best.map(|(mv, _)| mv)
}

/// Dirichlet sample via normalized Gamma variates.
pub(crate) fn dirichlet_noise(n: usize, alpha: f32, rng: &mut ChaCha20Rng) -> Vec<f32> {
    let gamma = match Gamma::new(alpha as f64, 1.0) {
        Ok(gamma) => gamma,
        Err(_) => return vec![1.0 / n.max(1) as f32; n],
    };
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    } else {
        samples.fill(1.0 / n.max(1) as f32);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SearchNode;
    use rand::SeedableRng;
    use xq_core::Board;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(3)
    }

    fn moves(specs: &[&str]) -> Vec<Move> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn quiet_config() -> SearchConfig {
        SearchConfig::for_testing()
    }

    #[test]
    fn test_empty_candidates_return_none() {
        let node = SearchNode::new(0, Vec::new());
        let state = node.lock();
        let picked = select_move(
            &Board::start(),
            &state,
            1,
            &quiet_config(),
            false,
            &[],
            &UniformComplexity,
            &mut rng(),
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_untried_edge_is_selected_first() {
        let legal = moves(&["a0a1", "a0a2", "i0i1"]);
        let node = SearchNode::new(0, legal.clone());
        {
            let mut state = node.lock();
            state.pending = false;
            for mv in &legal[..2] {
                let edge = state.edges.get_mut(mv).unwrap();
                edge.n = 5.0;
                edge.w = 4.0;
                edge.q = 0.8;
            }
        }
        for _ in 0..10 {
            node.record_visit();
        }

        let state = node.lock();
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            false,
            &[],
            &UniformComplexity,
            &mut rng(),
        );
        assert_eq!(picked, Some(legal[2]));
    }

    #[test]
    fn test_higher_q_wins_among_equally_visited() {
        let legal = moves(&["a0a1", "i0i1"]);
        let node = SearchNode::new(0, legal.clone());
        {
            let mut state = node.lock();
            state.pending = false;
            for (mv, q) in legal.iter().zip([0.1f32, 0.9]) {
                let edge = state.edges.get_mut(mv).unwrap();
                edge.n = 10.0;
                edge.w = q * 10.0;
                edge.q = q;
            }
        }
        for _ in 0..20 {
            node.record_visit();
        }

        let state = node.lock();
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            false,
            &[],
            &UniformComplexity,
            &mut rng(),
        );
        assert_eq!(picked, Some(legal[1]));
    }

    #[test]
    fn test_root_exclusions_are_skipped() {
        let legal = moves(&["a0a1", "i0i1"]);
        let node = SearchNode::new(0, legal.clone());
        node.lock().pending = false;

        let state = node.lock();
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            true,
            &legal[..1],
            &UniformComplexity,
            &mut rng(),
        );
        assert_eq!(picked, Some(legal[1]));

        // Excluding everything leaves no candidate.
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            true,
            &legal,
            &UniformComplexity,
            &mut rng(),
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_unlock_gate_defers_complex_moves() {
        struct Spiky(Move);
        impl MoveComplexity for Spiky {
            fn complexity(&self, _board: &Board, mv: Move) -> f32 {
                if mv == self.0 {
                    100.0
                } else {
                    0.01
                }
            }
        }

        let legal = moves(&["a0a1", "i0i1"]);
        let node = SearchNode::new(0, legal.clone());
        {
            let mut state = node.lock();
            state.pending = false;
            // Make the gated move look overwhelmingly attractive.
            let edge = state.edges.get_mut(&legal[1]).unwrap();
            edge.n = 1.0;
            edge.w = 1.0;
            edge.q = 1.0;
            let edge = state.edges.get_mut(&legal[0]).unwrap();
            edge.n = 1.0;
            edge.w = -1.0;
            edge.q = -1.0;
        }
        for _ in 0..5 {
            node.record_visit();
        }

        let gated = Spiky(legal[1]);
        let state = node.lock();
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            false,
            &[],
            &gated,
            &mut rng(),
        );
        // The attractive move stays behind the gate; the unlocked one
        // is taken despite its poor value.
        assert_eq!(picked, Some(legal[0]));

        // When every candidate is gated, the gate is ignored.
        struct AllLocked;
        impl MoveComplexity for AllLocked {
            fn complexity(&self, _board: &Board, _mv: Move) -> f32 {
                1e9
            }
        }
        let picked = select_move(
            &Board::start(),
            &state,
            node.visits(),
            &quiet_config(),
            false,
            &[],
            &AllLocked,
            &mut rng(),
        );
        assert_eq!(picked, Some(legal[1]));
    }

    #[test]
    fn test_dirichlet_noise_normalizes() {
        let noise = dirichlet_noise(6, 0.2, &mut rng());
        let sum: f32 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert!(noise.iter().all(|&x| x >= 0.0));
    }
}
