//! Core types for chess.
//!
//! This crate provides the vocabulary shared by the rules engine:
//! - [`PieceKind`], [`Piece`] and [`Color`] for piece representation
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`] and [`CastlingSide`] for moves
//! - FEN and EPD parsing and serialization

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{encode_placement, FenError, FenParser};
pub use mov::{CastlingSide, Move};
pub use piece::{Piece, PieceKind};
pub use square::{File, Rank, Square};
