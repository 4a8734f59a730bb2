//! Incremental Zobrist fingerprinting of positions.
//!
//! The hasher owns one random 64-bit constant per (cell, piece
//! identity) pair plus a side-to-move constant. A position's
//! fingerprint is the XOR of the constants for all occupied cells,
//! with the side constant folded in when Black is to move. Applying a
//! move only touches the constants of the cells involved, so
//! [`ZobristHasher::update`] is a handful of XORs instead of a full
//! board scan.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use xq_core::{Board, Move, Piece, Side, Square, PIECE_IDENTITIES, SQUARES};

/// Fixed construction seed so fingerprints are reproducible across
/// runs and processes.
const TABLE_SEED: u64 = 0x5A6F_6272_6973_7458;

/// Position fingerprinter. One instance lives in the engine; it is
/// immutable after construction and shared freely across workers.
#[derive(Debug, Clone)]
pub struct ZobristHasher {
    table: Vec<u64>,
    side_constant: u64,
}

impl Default for ZobristHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ZobristHasher {
    /// Construct the table from the fixed process-wide seed.
    pub fn new() -> Self {
        Self::with_seed(TABLE_SEED)
    }

    /// Construct from an explicit seed. Two hashers with the same seed
    /// assign identical fingerprints.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let table = (0..SQUARES * PIECE_IDENTITIES)
            .map(|_| rng.gen::<u64>())
            .collect();
        let side_constant = rng.gen::<u64>();
        Self {
            table,
            side_constant,
        }
    }

    #[inline]
    fn constant(&self, sq: Square, piece: Piece) -> u64 {
        self.table[sq.index() * PIECE_IDENTITIES + piece.identity()]
    }

    /// Fingerprint a position from scratch.
    pub fn hash(&self, board: &Board) -> u64 {
        let mut h = 0u64;
        for (sq, piece) in board.pieces() {
            h ^= self.constant(sq, piece);
        }
        if board.side_to_move() == Side::Black {
            h ^= self.side_constant;
        }
        h
    }

    /// Incrementally advance `hash` over `mv`. `moved` is the piece
    /// standing on `mv.from` before the move, `captured` the piece on
    /// `mv.to` if any. Equals `hash(apply(board, mv))` for every legal
    /// move.
    pub fn update(&self, hash: u64, mv: Move, moved: Piece, captured: Option<Piece>) -> u64 {
        let mut h = hash ^ self.constant(mv.from, moved);
        if let Some(victim) = captured {
            h ^= self.constant(mv.to, victim);
        }
        h ^= self.constant(mv.to, moved);
        h ^ self.side_constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_skirmish::{start_board, SkirmishRules};
    use xq_core::GameRules;

    #[test]
    fn test_hash_is_deterministic_across_instances() {
        let a = ZobristHasher::new();
        let b = ZobristHasher::new();
        let board = start_board();
        assert_eq!(a.hash(&board), b.hash(&board));
    }

    #[test]
    fn test_side_to_move_changes_hash() {
        let hasher = ZobristHasher::new();
        let board = start_board();
        let mut flipped = board.clone();
        flipped.set_side_to_move(board.side_to_move().opponent());
        assert_ne!(hasher.hash(&board), hasher.hash(&flipped));
    }

    #[test]
    fn test_update_matches_full_hash_for_all_legal_moves() {
        let hasher = ZobristHasher::new();
        let rules = SkirmishRules;
        let board = start_board();
        let base = hasher.hash(&board);

        for mv in rules.legal_moves(&board) {
            let moved = board.piece_at(mv.from).unwrap();
            let captured = board.piece_at(mv.to);
            let incremental = hasher.update(base, mv, moved, captured);
            let full = hasher.hash(&rules.apply(&board, mv));
            assert_eq!(incremental, full, "mismatch on move {mv}");
        }
    }

    #[test]
    fn test_update_matches_along_a_playout() {
        use rand::seq::SliceRandom;

        let hasher = ZobristHasher::new();
        let rules = SkirmishRules;
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        let mut board = start_board();
        let mut hash = hasher.hash(&board);
        for _ in 0..40 {
            let moves = rules.legal_moves(&board);
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            let moved = board.piece_at(mv.from).unwrap();
            let captured = board.piece_at(mv.to);
            hash = hasher.update(hash, mv, moved, captured);
            board = rules.apply(&board, mv);
            assert_eq!(hash, hasher.hash(&board));
        }
    }
}
