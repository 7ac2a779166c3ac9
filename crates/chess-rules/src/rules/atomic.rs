//! Atomic chess.
//!
//! Every capture explodes: the captured square and all non-pawn pieces on
//! the eight squares around it are cleared, the capturing piece included.
//! Kings never capture, a capture that would explode one's own king is
//! illegal, and exploding the enemy king wins. Kings standing next to each
//! other cannot give check, since capturing would blow up both.

use chess_core::{Color, PieceKind, Square};

use super::{standard, RuleSet, Variant};
use crate::error::MoveError;
use crate::movegen::attacks::{attackers, king_squares};
use crate::movegen::MoveGenOptions;
use crate::position::SquareChange;
use crate::{GameStatus, Position, Termination};

#[derive(Debug, Clone, Copy, Default)]
pub struct Atomic;

impl Atomic {
    /// Squares a capture must land on to explode the piece on `square`.
    fn detonation_squares(position: &Position, square: Square) -> Vec<Square> {
        match position.piece_at(square) {
            Some(p) if p.kind == PieceKind::Pawn => vec![square],
            Some(_) => std::iter::once(square).chain(king_squares(square)).collect(),
            None => Vec::new(),
        }
    }

    /// Whether `color` has a legal capture that removes the piece on `square`.
    pub fn can_explode_piece(&self, position: &mut Position, color: Color, square: Square) -> bool {
        let targets: Vec<Square> = Self::detonation_squares(position, square)
            .into_iter()
            .filter(|sq| position.piece_at(*sq).is_some_and(|p| p.color != color))
            .collect();
        if targets.is_empty() {
            return false;
        }
        let capturers: Vec<Square> = position.pieces(color).map(|(sq, _)| sq).collect();
        capturers.into_iter().any(|from| {
            self.pseudolegal_moves(position, from, MoveGenOptions::CAPTURES)
                .into_iter()
                .filter(|to| targets.contains(to))
                .any(|to| self.can_move_piece(position, from, to).is_ok())
        })
    }

    fn can_explode_opponent_king(&self, position: &mut Position, color: Color) -> bool {
        match position.live_king(color.opposite()) {
            Some(king) => self.can_explode_piece(position, color, king),
            None => false,
        }
    }

    fn can_explode_out_of_check(&self, position: &mut Position, color: Color) -> bool {
        let Some(king) = position.live_king(color) else {
            return false;
        };
        let checkers = attackers(position, king, color.opposite());
        !checkers.is_empty()
            && checkers
                .into_iter()
                .all(|(square, _)| self.can_explode_piece(position, color, square))
    }

    fn kings_touch(position: &Position) -> bool {
        match (
            position.live_king(Color::White),
            position.live_king(Color::Black),
        ) {
            (Some(white), Some(black)) => white.is_adjacent(black),
            _ => false,
        }
    }
}

impl RuleSet for Atomic {
    fn variant(&self) -> Variant {
        Variant::Atomic
    }

    fn king_can_capture(&self) -> bool {
        false
    }

    fn is_checked_square(&self, position: &Position, color: Color, square: Square) -> bool {
        let beside_enemy_king = position
            .live_king(color.opposite())
            .is_some_and(|king| king.is_adjacent(square));
        !beside_enemy_king && standard::is_checked_square(position, color, square)
    }

    fn king_is_in_check(&self, position: &Position, color: Color) -> Option<bool> {
        position.king_square(color)?;
        if Color::ALL.into_iter().any(|c| self.king_exploded(position, c)) || Self::kings_touch(position)
        {
            return Some(false);
        }
        standard::king_is_in_check(self, position, color)
    }

    fn capture_changes(&self, position: &Position, square: Square) -> Vec<SquareChange> {
        let mut changes = vec![(square, None)];
        changes.extend(
            king_squares(square)
                .filter(|sq| {
                    position
                        .piece_at(*sq)
                        .is_some_and(|p| p.kind != PieceKind::Pawn)
                })
                .map(|sq| (sq, None)),
        );
        changes
    }

    fn king_exploded(&self, position: &Position, color: Color) -> bool {
        position.king_square(color).is_some() && position.live_king(color).is_none()
    }

    fn can_move_piece(
        &self,
        position: &mut Position,
        from: Square,
        to: Square,
    ) -> Result<(), MoveError> {
        let piece = position.piece_at(from).ok_or(MoveError::NoPiece(from))?;
        let captures = position.piece_at(to).is_some_and(|p| p.color != piece.color);
        if captures {
            let own_king_near = position
                .live_king(piece.color)
                .is_some_and(|king| king == from || king.is_adjacent(to));
            if own_king_near && position.piece_at(to).is_some_and(|p| p.kind != PieceKind::King) {
                return Err(MoveError::SuicidalCapture);
            }
        }
        standard::can_move_piece(self, position, from, to)
    }

    fn extra_check_escape(&self, position: &mut Position, color: Color) -> bool {
        self.can_explode_opponent_king(position, color)
            || self.can_explode_out_of_check(position, color)
    }

    fn variant_outcome(&self, position: &Position) -> Option<GameStatus> {
        Color::ALL
            .into_iter()
            .find(|color| self.king_exploded(position, *color))
            .map(|color| GameStatus::won(color.opposite(), Termination::Explosion))
    }
}
