//! Rule set abstraction for chess variants.
//!
//! The [`RuleSet`] trait carries every question whose answer depends on the
//! variant: what counts as check, what a capture does to the board, which
//! positions are won. Its provided methods implement standard chess through
//! the free functions in [`standard`], so a variant overrides only the hooks
//! it changes and calls those functions where it wants the standard
//! behaviour as a fallback.

mod atomic;
mod horde;
mod king_of_the_hill;
pub mod standard;

pub use atomic::Atomic;
pub use horde::Horde;
pub use king_of_the_hill::{KingOfTheHill, HILL};
pub use standard::Standard;

use std::fmt;
use std::str::FromStr;

use chess_core::{CastlingSide, Color, FenParser, Piece, Square};
use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::movegen::{self, MoveGenOptions};
use crate::position::SquareChange;
use crate::{GameStatus, Position};

/// Variant-specific rules.
///
/// Probing methods take `&mut Position` because they simulate moves with
/// [`Position::test_position`]; the position is always restored before they
/// return.
///
/// # Example
///
/// ```
/// use chess_core::{FenParser, Square};
/// use chess_rules::rules::{RuleSet, Standard};
/// use chess_rules::Position;
///
/// let mut position = Position::from_fen(FenParser::STARTPOS).unwrap();
/// let knight = Square::from_algebraic("g1").unwrap();
/// assert_eq!(Standard.legal_moves(&mut position, knight).len(), 2);
/// ```
pub trait RuleSet: fmt::Debug + Send + Sync {
    fn variant(&self) -> Variant;

    fn starting_fen(&self) -> &'static str {
        FenParser::STARTPOS
    }

    /// Whether the pawn on `from` may advance two squares, occupancy aside.
    fn pawn_can_double_step(&self, position: &Position, from: Square, pawn: Piece) -> bool {
        let _ = position;
        from.rank() == pawn.color.pawn_rank()
    }

    /// Whether kings may capture. Atomic kings cannot.
    fn king_can_capture(&self) -> bool {
        true
    }

    fn pseudolegal_moves(
        &self,
        position: &mut Position,
        from: Square,
        options: MoveGenOptions,
    ) -> Vec<Square> {
        movegen::pseudolegal_moves(self, position, from, options)
    }

    /// Whether a king of `color` standing on `square` would be in check.
    fn is_checked_square(&self, position: &Position, color: Color, square: Square) -> bool {
        standard::is_checked_square(position, color, square)
    }

    /// `None` when `color` has no king.
    fn king_is_in_check(&self, position: &Position, color: Color) -> Option<bool> {
        standard::king_is_in_check(self, position, color)
    }

    /// Extra board changes caused by a capture landing on `square`, applied
    /// after the capturing piece arrives.
    fn capture_changes(&self, position: &Position, square: Square) -> Vec<SquareChange> {
        let _ = (position, square);
        Vec::new()
    }

    /// Whether `color` had a king that is no longer on the board.
    fn king_exploded(&self, position: &Position, color: Color) -> bool {
        let _ = (position, color);
        false
    }

    /// Validates a non-castling move without changing the position.
    fn can_move_piece(
        &self,
        position: &mut Position,
        from: Square,
        to: Square,
    ) -> Result<(), MoveError> {
        standard::can_move_piece(self, position, from, to)
    }

    fn can_castle(
        &self,
        position: &mut Position,
        color: Color,
        side: CastlingSide,
    ) -> Result<(), MoveError> {
        standard::can_castle(self, position, color, side)
    }

    /// Validates an en passant capture and returns the capturing pawn's
    /// square. With no capturer given, one is inferred from the pawns of the
    /// side to move standing beside the passed pawn.
    fn can_en_passant(
        &self,
        position: &mut Position,
        capturer: Option<Square>,
    ) -> Result<Square, MoveError> {
        standard::can_en_passant(self, position, capturer)
    }

    /// Legal destinations of the piece on `from`, castling included.
    fn legal_moves(&self, position: &mut Position, from: Square) -> Vec<Square> {
        standard::legal_moves(self, position, from)
    }

    /// A way out of check beyond blocking, capturing or moving the king.
    fn extra_check_escape(&self, position: &mut Position, color: Color) -> bool {
        let _ = (position, color);
        false
    }

    /// A variant-specific win, checked before checkmate.
    fn variant_outcome(&self, position: &Position) -> Option<GameStatus> {
        let _ = position;
        None
    }

    /// Checks both colors for mate. Colors in `known_in_check` skip the
    /// check test.
    fn is_checkmate(
        &self,
        position: &mut Position,
        known_in_check: &[Color],
    ) -> Option<GameStatus> {
        standard::is_checkmate(self, position, known_in_check)
    }

    fn is_stalemate(&self, position: &mut Position) -> bool {
        standard::is_stalemate(self, position)
    }

    fn has_sufficient_material(&self, position: &Position, color: Color) -> bool {
        standard::has_sufficient_material(position, color)
    }

    fn insufficient_material(&self, position: &Position) -> Option<GameStatus> {
        standard::insufficient_material(position)
    }
}

/// The supported variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Standard,
    Atomic,
    Horde,
    KingOfTheHill,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Standard,
        Variant::Atomic,
        Variant::Horde,
        Variant::KingOfTheHill,
    ];

    pub fn rules(self) -> Box<dyn RuleSet> {
        match self {
            Variant::Standard => Box::new(Standard),
            Variant::Atomic => Box::new(Atomic),
            Variant::Horde => Box::new(Horde),
            Variant::KingOfTheHill => Box::new(KingOfTheHill),
        }
    }

    /// Value of the PGN `Variant` tag. Standard games omit the tag.
    pub const fn pgn_name(self) -> Option<&'static str> {
        match self {
            Variant::Standard => None,
            Variant::Atomic => Some("Atomic"),
            Variant::Horde => Some("Horde"),
            Variant::KingOfTheHill => Some("King of the Hill"),
        }
    }

    /// Reads a PGN `Variant` tag, ignoring case, spaces and dashes.
    pub fn from_pgn_name(name: &str) -> Option<Variant> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "" | "standard" | "chess" => Some(Variant::Standard),
            "atomic" => Some(Variant::Atomic),
            "horde" => Some(Variant::Horde),
            "kingofthehill" | "koth" => Some(Variant::KingOfTheHill),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pgn_name().unwrap_or("Standard"))
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::from_pgn_name(s).ok_or_else(|| format!("unknown variant: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>(), Ok(variant));
            assert_eq!(variant.rules().variant(), variant);
        }
        assert_eq!("king-of-the-hill".parse::<Variant>(), Ok(Variant::KingOfTheHill));
        assert!("crazyhouse".parse::<Variant>().is_err());
    }

    #[test]
    fn horde_has_its_own_start() {
        assert_ne!(Variant::Horde.rules().starting_fen(), FenParser::STARTPOS);
        assert_eq!(Variant::Atomic.rules().starting_fen(), FenParser::STARTPOS);
    }
}
