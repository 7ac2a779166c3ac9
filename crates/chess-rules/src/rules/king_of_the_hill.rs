//! King of the Hill: standard chess, plus a win for the first king to reach
//! one of the four centre squares.

use chess_core::{Color, Square};

use super::{RuleSet, Variant};
use crate::{GameStatus, Position, Termination};

pub const HILL: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

#[derive(Debug, Clone, Copy, Default)]
pub struct KingOfTheHill;

impl RuleSet for KingOfTheHill {
    fn variant(&self) -> Variant {
        Variant::KingOfTheHill
    }

    fn variant_outcome(&self, position: &Position) -> Option<GameStatus> {
        Color::ALL
            .into_iter()
            .find(|color| {
                position
                    .live_king(*color)
                    .is_some_and(|king| HILL.contains(&king))
            })
            .map(|color| GameStatus::won(color, Termination::KingReachedHill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn king_on_hill_wins() {
        let pos = Position::from_fen("4k3/8/8/8/3K4/8/8/8 b - - 0 1").unwrap();
        assert_eq!(
            KingOfTheHill.variant_outcome(&pos),
            Some(GameStatus::won(Color::White, Termination::KingReachedHill))
        );
    }

    #[test]
    fn black_king_on_e5_wins() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            KingOfTheHill.variant_outcome(&pos),
            Some(GameStatus::won(Color::Black, Termination::KingReachedHill))
        );
    }

    #[test]
    fn other_pieces_on_hill_do_not_count() {
        let pos = Position::from_fen("4k3/8/8/3Q4/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(KingOfTheHill.variant_outcome(&pos), None);
    }
}
