//! The rules seam between the search engine and a concrete game.
//!
//! The search never interprets a position itself: move generation,
//! terminal detection, repetition adjudication and network-input
//! encoding all go through [`GameRules`].

use crate::{Board, Move, SQUARES};

/// Outcome classification for a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminal {
    /// Play continues.
    Ongoing,
    /// The game is over. `value` is from the perspective of the side
    /// to move in the inspected position: -1.0 is a loss for that
    /// side, +1.0 a win, 0.0 a draw.
    Over { value: f32 },
}

/// How a repetition encountered during search should be scored for the
/// player who just repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionClass {
    /// The repeating side is perpetually chasing; it loses.
    Chase,
    /// The repeating side is the one being chased; it wins.
    Chased,
    /// Mutual or neutral repetition; scored as a draw.
    Neutral,
}

/// Number of input planes produced by [`GameRules::encode_planes`]:
/// one per piece identity plus a side-to-move plane.
pub const INPUT_PLANES: usize = crate::PIECE_IDENTITIES + 1;

/// Game rules as seen by the search engine.
///
/// Implementations must be deterministic and cheap to call: the search
/// invokes `legal_moves` and `terminal` on every simulation step.
pub trait GameRules: Send + Sync {
    /// All legal moves for the side to move. Empty for terminal
    /// positions, and possibly for stalemates the implementation
    /// chooses not to mark terminal.
    fn legal_moves(&self, board: &Board) -> Vec<Move>;

    /// Apply a legal move, returning the successor position.
    fn apply(&self, board: &Board, mv: Move) -> Board;

    /// Classify the position for the side to move.
    fn terminal(&self, board: &Board) -> Terminal;

    /// Adjudicate a repetition reached by playing `reply` into a
    /// position already on the current line. The classification is for
    /// the side that played `reply`.
    fn repetition_classification(&self, board: &Board, reply: Move) -> RepetitionClass;

    /// Encode the position as flat network-input planes, most recent
    /// history entries first. The default layout is
    /// [`INPUT_PLANES`] planes of 90 cells each.
    fn encode_planes(&self, board: &Board, history: &[Board]) -> Vec<f32> {
        let _ = history;
        encode_board_planes(board)
    }
}

/// Default single-position plane encoding: one binary plane per piece
/// identity plus a constant side-to-move plane.
pub fn encode_board_planes(board: &Board) -> Vec<f32> {
    let mut planes = vec![0.0f32; INPUT_PLANES * SQUARES];
    for (sq, piece) in board.pieces() {
        planes[piece.identity() * SQUARES + sq.index()] = 1.0;
    }
    let side_plane = crate::PIECE_IDENTITIES * SQUARES;
    let fill = match board.side_to_move() {
        crate::Side::Red => 1.0,
        crate::Side::Black => 0.0,
    };
    for cell in &mut planes[side_plane..side_plane + SQUARES] {
        *cell = fill;
    }
    planes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    #[test]
    fn test_encode_planes_shape_and_occupancy() {
        let board = Board::start();
        let planes = encode_board_planes(&board);
        assert_eq!(planes.len(), INPUT_PLANES * SQUARES);

        // 32 pieces occupy exactly 32 cells across the identity planes.
        let piece_cells: f32 = planes[..crate::PIECE_IDENTITIES * SQUARES].iter().sum();
        assert_eq!(piece_cells, 32.0);

        // Red to move fills the side plane.
        let side_sum: f32 = planes[crate::PIECE_IDENTITIES * SQUARES..].iter().sum();
        assert_eq!(side_sum, SQUARES as f32);
    }

    #[test]
    fn test_encode_planes_side_plane_tracks_mover() {
        let mut board = Board::start();
        board.set_side_to_move(Side::Black);
        let planes = encode_board_planes(&board);
        let side_sum: f32 = planes[crate::PIECE_IDENTITIES * SQUARES..].iter().sum();
        assert_eq!(side_sum, 0.0);
    }
}
