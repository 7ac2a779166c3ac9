//! Horde: thirty-six white pawns and no white king against a full black
//! army. Black wins by capturing every white piece.

use chess_core::{Color, Piece, Square};

use super::{RuleSet, Variant};
use crate::{GameStatus, Position, Termination};

pub const HORDE_FEN: &str =
    "rnbqkbnr/pppppppp/8/1PP2PP1/PPPPPPPP/PPPPPPPP/PPPPPPPP/PPPPPPPP w kq - 0 1";

#[derive(Debug, Clone, Copy, Default)]
pub struct Horde;

impl RuleSet for Horde {
    fn variant(&self) -> Variant {
        Variant::Horde
    }

    fn starting_fen(&self) -> &'static str {
        HORDE_FEN
    }

    /// Unmoved pawns may double-step from any rank, so the first-rank horde
    /// pawns can advance two squares.
    fn pawn_can_double_step(&self, _position: &Position, from: Square, pawn: Piece) -> bool {
        !pawn.has_moved || from.rank() == pawn.color.pawn_rank()
    }

    fn variant_outcome(&self, position: &Position) -> Option<GameStatus> {
        if position.pieces(Color::White).next().is_none() {
            return Some(GameStatus::won(Color::Black, Termination::AllPiecesCaptured));
        }
        None
    }

    /// Material is never insufficient: a single horde pawn can still queen.
    fn insufficient_material(&self, _position: &Position) -> Option<GameStatus> {
        None
    }
}
