//! Board representation: squares, pieces, moves, and the position itself.
//!
//! `Board` doubles as the search tree's position key: it derives `Eq`,
//! `Hash` and `Ord`, so two boards compare equal exactly when they denote
//! the same game state (placement plus side to move).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{FILES, RANKS, SQUARES};

/// Errors raised while parsing FEN strings or coordinate moves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("unknown piece character '{0}'")]
    UnknownPiece(char),

    #[error("malformed board field: {0}")]
    MalformedBoard(String),

    #[error("malformed side-to-move field: {0}")]
    MalformedSide(String),

    #[error("malformed square '{0}'")]
    MalformedSquare(String),

    #[error("malformed move '{0}'")]
    MalformedMove(String),
}

/// Side to move. Red moves first in xiangqi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Red,
    Black,
}

impl Side {
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }
}

/// Piece kind, shared by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Chariot,
    Horse,
    Elephant,
    Advisor,
    General,
    Cannon,
    Soldier,
}

impl PieceKind {
    /// All kinds, in the order of their identity indices.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::Chariot,
        PieceKind::Horse,
        PieceKind::Elephant,
        PieceKind::Advisor,
        PieceKind::General,
        PieceKind::Cannon,
        PieceKind::Soldier,
    ];

    #[inline]
    fn ordinal(self) -> usize {
        match self {
            PieceKind::Chariot => 0,
            PieceKind::Horse => 1,
            PieceKind::Elephant => 2,
            PieceKind::Advisor => 3,
            PieceKind::General => 4,
            PieceKind::Cannon => 5,
            PieceKind::Soldier => 6,
        }
    }

    fn letter(self) -> char {
        match self {
            PieceKind::Chariot => 'R',
            PieceKind::Horse => 'N',
            PieceKind::Elephant => 'B',
            PieceKind::Advisor => 'A',
            PieceKind::General => 'K',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }
}

/// A piece: kind plus owning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Dense identity index in `0..14`: `kind * 2 + (1 if Black)`.
    /// Used by the Zobrist table layout.
    #[inline]
    pub fn identity(self) -> usize {
        self.kind.ordinal() * 2
            + match self.side {
                Side::Red => 0,
                Side::Black => 1,
            }
    }

    /// FEN character: uppercase for Red, lowercase for Black.
    pub fn to_char(self) -> char {
        let c = self.kind.letter();
        match self.side {
            Side::Red => c,
            Side::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Result<Self, FenError> {
        let side = if c.is_ascii_uppercase() {
            Side::Red
        } else {
            Side::Black
        };
        let kind = match c.to_ascii_uppercase() {
            'R' => PieceKind::Chariot,
            'N' => PieceKind::Horse,
            'B' => PieceKind::Elephant,
            'A' => PieceKind::Advisor,
            'K' => PieceKind::General,
            'C' => PieceKind::Cannon,
            'P' => PieceKind::Soldier,
            _ => return Err(FenError::UnknownPiece(c)),
        };
        Ok(Self { side, kind })
    }
}

/// A board cell. Rank 0 is Red's back rank, file 0 is Red's leftmost file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub rank: u8,
    pub file: u8,
}

impl Square {
    pub fn new(rank: u8, file: u8) -> Option<Self> {
        if (rank as usize) < RANKS && (file as usize) < FILES {
            Some(Self { rank, file })
        } else {
            None
        }
    }

    /// Flat cell index in `0..90`.
    #[inline]
    pub fn index(self) -> usize {
        self.rank as usize * FILES + self.file as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index < SQUARES {
            Some(Self {
                rank: (index / FILES) as u8,
                file: (index % FILES) as u8,
            })
        } else {
            None
        }
    }

    /// Iterate every square, rank 0 file 0 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..SQUARES).filter_map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank)
    }
}

impl FromStr for Square {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(FenError::MalformedSquare(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        Square::new(rank, file).ok_or_else(|| FenError::MalformedSquare(s.to_string()))
    }
}

/// A move in coordinate form, e.g. `a0a1`. Legality is the rules
/// engine's concern; this type is purely geometric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 {
            return Err(FenError::MalformedMove(s.to_string()));
        }
        let from = s[0..2].parse()?;
        let to = s[2..4].parse()?;
        Ok(Move { from, to })
    }
}

/// A complete position: piece placement plus side to move.
///
/// Equality and ordering cover both fields, so `Board` serves directly
/// as the search tree's totally-ordered position key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Board {
    cells: [Option<Piece>; SQUARES],
    side_to_move: Side,
}

impl Board {
    /// An empty board with Red to move.
    pub fn empty() -> Self {
        Self {
            cells: [None; SQUARES],
            side_to_move: Side::Red,
        }
    }

    /// The standard xiangqi starting position.
    pub fn start() -> Self {
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w"
            .parse()
            .expect("start position FEN is valid")
    }

    #[inline]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, side: Side) {
        self.side_to_move = side;
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.index()] = piece;
    }

    /// Iterate occupied cells.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, p)| {
            p.map(|piece| (Square::from_index(i).unwrap(), piece))
        })
    }

    /// Mechanically play a move: relocate the mover, flip the side to
    /// move, and return the captured piece if any. Does not check
    /// legality.
    pub fn make_move(&mut self, mv: Move) -> Option<Piece> {
        let mover = self.cells[mv.from.index()].take();
        let captured = std::mem::replace(&mut self.cells[mv.to.index()], mover);
        self.side_to_move = self.side_to_move.opponent();
        captured
    }

    /// Non-mutating variant of [`make_move`](Self::make_move).
    pub fn with_move(&self, mv: Move) -> (Board, Option<Piece>) {
        let mut next = self.clone();
        let captured = next.make_move(mv);
        (next, captured)
    }

    /// Serialize to FEN (placement from rank 9 down, then side field).
    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..RANKS).rev() {
            let mut run = 0;
            for file in 0..FILES {
                let sq = Square::new(rank as u8, file as u8).unwrap();
                match self.piece_at(sq) {
                    Some(piece) => {
                        if run > 0 {
                            out.push(char::from_digit(run, 10).unwrap());
                            run = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => run += 1,
                }
            }
            if run > 0 {
                out.push(char::from_digit(run, 10).unwrap());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out.push(' ');
        out.push(match self.side_to_move {
            Side::Red => 'w',
            Side::Black => 'b',
        });
        out
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| FenError::MalformedBoard(s.to_string()))?;
        let side = fields
            .next()
            .ok_or_else(|| FenError::MalformedSide("missing".to_string()))?;

        let mut board = Board::empty();
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != RANKS {
            return Err(FenError::MalformedBoard(placement.to_string()));
        }

        for (i, row) in rows.iter().enumerate() {
            let rank = (RANKS - 1 - i) as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let sq = Square::new(rank, file)
                        .ok_or_else(|| FenError::MalformedBoard(placement.to_string()))?;
                    board.set_piece(sq, Some(Piece::from_char(c)?));
                    file += 1;
                }
            }
            if file as usize != FILES {
                return Err(FenError::MalformedBoard(placement.to_string()));
            }
        }

        board.side_to_move = match side {
            "w" => Side::Red,
            "b" => Side::Black,
            other => return Err(FenError::MalformedSide(other.to_string())),
        };
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}
