//! Xiangqi rules engine.
//!
//! Implements [`GameRules`] with pseudo-legal move generation: a move is
//! offered whenever the piece geometry allows it and the destination is
//! not occupied by a friendly piece. Leaving one's own general en prise
//! is permitted; the game ends when a general is actually captured,
//! which keeps terminal detection a single occupancy scan.

use xq_core::{
    Board, GameRules, Move, Piece, PieceKind, RepetitionClass, Side, Square, Terminal,
};

/// Xiangqi rules: palace-bound generals and advisors, river-bound
/// elephants, leg-blocked horses, screen-jumping cannons, soldiers that
/// gain sideways movement after crossing the river.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkirmishRules;

/// The standard starting position.
pub fn start_board() -> Board {
    Board::start()
}

const ORTHO: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAG: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn offset(sq: Square, dr: i8, df: i8) -> Option<Square> {
    let rank = sq.rank as i8 + dr;
    let file = sq.file as i8 + df;
    if rank < 0 || file < 0 {
        return None;
    }
    Square::new(rank as u8, file as u8)
}

fn in_palace(side: Side, sq: Square) -> bool {
    let rank_ok = match side {
        Side::Red => sq.rank <= 2,
        Side::Black => sq.rank >= 7,
    };
    rank_ok && (3..=5).contains(&sq.file)
}

fn across_river(side: Side, rank: u8) -> bool {
    match side {
        Side::Red => rank >= 5,
        Side::Black => rank <= 4,
    }
}

fn own_half(side: Side, rank: u8) -> bool {
    !across_river(side, rank)
}

fn forward(side: Side) -> i8 {
    match side {
        Side::Red => 1,
        Side::Black => -1,
    }
}

impl SkirmishRules {
    fn push_if_landable(board: &Board, side: Side, from: Square, to: Square, out: &mut Vec<Move>) {
        match board.piece_at(to) {
            Some(p) if p.side == side => {}
            _ => out.push(Move::new(from, to)),
        }
    }

    fn slide(board: &Board, side: Side, from: Square, dr: i8, df: i8, out: &mut Vec<Move>) {
        let mut cur = from;
        while let Some(next) = offset(cur, dr, df) {
            match board.piece_at(next) {
                None => out.push(Move::new(from, next)),
                Some(p) => {
                    if p.side != side {
                        out.push(Move::new(from, next));
                    }
                    break;
                }
            }
            cur = next;
        }
    }

    fn cannon_slide(board: &Board, side: Side, from: Square, dr: i8, df: i8, out: &mut Vec<Move>) {
        let mut cur = from;
        // Quiet moves up to the screen.
        loop {
            match offset(cur, dr, df) {
                Some(next) if board.piece_at(next).is_none() => {
                    out.push(Move::new(from, next));
                    cur = next;
                }
                Some(next) => {
                    cur = next;
                    break;
                }
                None => return,
            }
        }
        // Past the screen, the first piece is capturable.
        while let Some(next) = offset(cur, dr, df) {
            match board.piece_at(next) {
                None => cur = next,
                Some(p) => {
                    if p.side != side {
                        out.push(Move::new(from, next));
                    }
                    return;
                }
            }
        }
    }

    fn piece_moves(board: &Board, from: Square, piece: Piece, out: &mut Vec<Move>) {
        let side = piece.side;
        match piece.kind {
            PieceKind::General => {
                for (dr, df) in ORTHO {
                    if let Some(to) = offset(from, dr, df) {
                        if in_palace(side, to) {
                            Self::push_if_landable(board, side, from, to, out);
                        }
                    }
                }
                // Flying general: capture the facing general along an
                // open file.
                let dr = forward(side);
                let mut cur = from;
                while let Some(next) = offset(cur, dr, 0) {
                    match board.piece_at(next) {
                        None => cur = next,
                        Some(p) => {
                            if p.side != side && p.kind == PieceKind::General {
                                out.push(Move::new(from, next));
                            }
                            break;
                        }
                    }
                }
            }
            PieceKind::Advisor => {
                for (dr, df) in DIAG {
                    if let Some(to) = offset(from, dr, df) {
                        if in_palace(side, to) {
                            Self::push_if_landable(board, side, from, to, out);
                        }
                    }
                }
            }
            PieceKind::Elephant => {
                for (dr, df) in DIAG {
                    let eye = match offset(from, dr, df) {
                        Some(sq) => sq,
                        None => continue,
                    };
                    if board.piece_at(eye).is_some() {
                        continue;
                    }
                    if let Some(to) = offset(from, dr * 2, df * 2) {
                        if own_half(side, to.rank) {
                            Self::push_if_landable(board, side, from, to, out);
                        }
                    }
                }
            }
            PieceKind::Horse => {
                for (leg_dr, leg_df) in ORTHO {
                    let leg = match offset(from, leg_dr, leg_df) {
                        Some(sq) => sq,
                        None => continue,
                    };
                    if board.piece_at(leg).is_some() {
                        continue;
                    }
                    for bend in [-1, 1] {
                        let (dr, df) = if leg_dr != 0 {
                            (leg_dr * 2, bend)
                        } else {
                            (bend, leg_df * 2)
                        };
                        if let Some(to) = offset(from, dr, df) {
                            Self::push_if_landable(board, side, from, to, out);
                        }
                    }
                }
            }
            PieceKind::Chariot => {
                for (dr, df) in ORTHO {
                    Self::slide(board, side, from, dr, df, out);
                }
            }
            PieceKind::Cannon => {
                for (dr, df) in ORTHO {
                    Self::cannon_slide(board, side, from, dr, df, out);
                }
            }
            PieceKind::Soldier => {
                if let Some(to) = offset(from, forward(side), 0) {
                    Self::push_if_landable(board, side, from, to, out);
                }
                if across_river(side, from.rank) {
                    for df in [-1, 1] {
                        if let Some(to) = offset(from, 0, df) {
                            Self::push_if_landable(board, side, from, to, out);
                        }
                    }
                }
            }
        }
    }

    fn general_square(board: &Board, side: Side) -> Option<Square> {
        board
            .pieces()
            .find(|(_, p)| p.side == side && p.kind == PieceKind::General)
            .map(|(sq, _)| sq)
    }

    /// Whether `side` currently attacks the opposing general.
    fn gives_check(board: &Board, side: Side) -> bool {
        let target = match Self::general_square(board, side.opponent()) {
            Some(sq) => sq,
            None => return false,
        };
        let mut moves = Vec::new();
        for (from, piece) in board.pieces().filter(|(_, p)| p.side == side) {
            Self::piece_moves(board, from, piece, &mut moves);
        }
        moves.iter().any(|mv| mv.to == target)
    }
}

impl GameRules for SkirmishRules {
    fn legal_moves(&self, board: &Board) -> Vec<Move> {
        let side = board.side_to_move();
        let mut moves = Vec::with_capacity(48);
        for (from, piece) in board.pieces().filter(|(_, p)| p.side == side) {
            Self::piece_moves(board, from, piece, &mut moves);
        }
        moves
    }

    fn apply(&self, board: &Board, mv: Move) -> Board {
        board.with_move(mv).0
    }

    fn terminal(&self, board: &Board) -> Terminal {
        let side = board.side_to_move();
        if Self::general_square(board, side).is_none() {
            return Terminal::Over { value: -1.0 };
        }
        if self.legal_moves(board).is_empty() {
            // Stalemate loses in xiangqi.
            return Terminal::Over { value: -1.0 };
        }
        Terminal::Ongoing
    }

    fn repetition_classification(&self, board: &Board, reply: Move) -> RepetitionClass {
        let mover = board.side_to_move();
        let (next, _) = board.with_move(reply);
        if Self::gives_check(&next, mover) {
            // Perpetual check counts against the checking side.
            RepetitionClass::Chase
        } else if Self::gives_check(&next, mover.opponent()) {
            RepetitionClass::Chased
        } else {
            RepetitionClass::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().expect("test FEN")
    }

    #[test]
    fn test_start_position_move_count() {
        let rules = SkirmishRules;
        let moves = rules.legal_moves(&start_board());
        assert_eq!(moves.len(), 44);
    }

    #[test]
    fn test_horse_leg_block() {
        let rules = SkirmishRules;
        // Lone red horse in the middle: all eight destinations.
        let open = board("4k4/9/9/9/9/4N4/9/9/9/4K4 w");
        let horse_moves = rules
            .legal_moves(&open)
            .into_iter()
            .filter(|mv| mv.from == "e4".parse().unwrap())
            .count();
        assert_eq!(horse_moves, 8);

        // A pawn on the leg square removes both bends on that side.
        let blocked = board("4k4/9/9/9/4p4/4N4/9/9/9/4K4 w");
        let horse_moves = rules
            .legal_moves(&blocked)
            .into_iter()
            .filter(|mv| mv.from == "e4".parse().unwrap())
            .count();
        assert_eq!(horse_moves, 6);
    }

    #[test]
    fn test_cannon_screen_capture() {
        let rules = SkirmishRules;
        // Cannon e2, screen e5, enemy chariot e8.
        let pos = board("4k4/4r4/9/9/4P4/9/9/4C4/9/4K4 w");
        let moves = rules.legal_moves(&pos);
        let capture = Move::new("e2".parse().unwrap(), "e8".parse().unwrap());
        assert!(moves.contains(&capture));
        // It cannot land on the screen or pass it quietly.
        assert!(!moves.contains(&Move::new("e2".parse().unwrap(), "e5".parse().unwrap())));
        assert!(!moves.contains(&Move::new("e2".parse().unwrap(), "e6".parse().unwrap())));
    }

    #[test]
    fn test_elephant_river_and_eye() {
        let rules = SkirmishRules;
        // Red elephant on c4 may not cross to rank 6.
        let pos = board("4k4/9/9/9/9/2B6/9/9/9/4K4 w");
        let dests: Vec<Square> = rules
            .legal_moves(&pos)
            .into_iter()
            .filter(|mv| mv.from == "c4".parse().unwrap())
            .map(|mv| mv.to)
            .collect();
        assert!(dests.contains(&"a2".parse().unwrap()));
        assert!(dests.contains(&"e2".parse().unwrap()));
        assert!(!dests.contains(&"a6".parse().unwrap()));
        assert!(!dests.contains(&"e6".parse().unwrap()));
    }

    #[test]
    fn test_soldier_gains_sideways_after_river() {
        let rules = SkirmishRules;
        let before = board("4k4/9/9/9/9/9/4P4/9/9/4K4 w");
        let dests: Vec<Move> = rules
            .legal_moves(&before)
            .into_iter()
            .filter(|mv| mv.from == "e3".parse().unwrap())
            .collect();
        assert_eq!(dests.len(), 1);

        let after = board("4k4/9/9/4P4/9/9/9/9/9/4K4 w");
        let dests: Vec<Move> = rules
            .legal_moves(&after)
            .into_iter()
            .filter(|mv| mv.from == "e6".parse().unwrap())
            .collect();
        assert_eq!(dests.len(), 3);
    }

    #[test]
    fn test_general_capture_is_terminal() {
        let rules = SkirmishRules;
        let pos = board("4k4/9/9/9/9/9/9/9/9/9 w");
        assert_eq!(rules.terminal(&pos), Terminal::Over { value: -1.0 });
        assert_eq!(rules.terminal(&start_board()), Terminal::Ongoing);
    }

    #[test]
    fn test_flying_general() {
        let rules = SkirmishRules;
        let pos = board("4k4/9/9/9/9/9/9/9/9/4K4 w");
        let moves = rules.legal_moves(&pos);
        assert!(moves.contains(&Move::new("e0".parse().unwrap(), "e9".parse().unwrap())));
    }

    #[test]
    fn test_repetition_classification() {
        let rules = SkirmishRules;
        // Black king on d9, red chariot on e1.
        let pos = board("3k5/9/9/9/9/9/9/9/4R4/4K4 w");
        // Sliding onto the king's file delivers check: a chase for Red.
        let check = Move::new("e1".parse().unwrap(), "d1".parse().unwrap());
        assert_eq!(
            rules.repetition_classification(&pos, check),
            RepetitionClass::Chase
        );
        // A quiet shuffle on the e-file threatens nothing.
        let quiet = Move::new("e1".parse().unwrap(), "e2".parse().unwrap());
        assert_eq!(
            rules.repetition_classification(&pos, quiet),
            RepetitionClass::Neutral
        );
    }

    #[test]
    fn test_apply_flips_side() {
        let rules = SkirmishRules;
        let start = start_board();
        let mv = rules.legal_moves(&start)[0];
        let next = rules.apply(&start, mv);
        assert_eq!(next.side_to_move(), Side::Black);
    }
}
