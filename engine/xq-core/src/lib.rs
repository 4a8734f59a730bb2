//! Core board model and rules-engine interface for the xiangqi search engine
//!
//! This crate provides the narrow surface the search engine consumes:
//! - `Board`, `Square`, `Piece`, `Move`: the position data model
//! - `GameRules`: the trait a rules engine implements (move legality,
//!   terminal detection, repetition classification, plane encoding)
//!
//! The search engine never inspects game rules itself; everything that
//! depends on how pieces actually move goes through `GameRules`.

pub mod board;
pub mod rules;

pub use board::{Board, FenError, Move, Piece, PieceKind, Side, Square};
pub use rules::{GameRules, RepetitionClass, Terminal};

/// Number of ranks on the board (rows, 0 = Red's back rank).
pub const RANKS: usize = 10;
/// Number of files on the board (columns).
pub const FILES: usize = 9;
/// Total board cells.
pub const SQUARES: usize = RANKS * FILES;
/// Distinct piece identities (7 kinds x 2 sides).
pub const PIECE_IDENTITIES: usize = 14;
