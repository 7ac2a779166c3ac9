//! Game outcome values.

use std::fmt;

use chess_core::Color;

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    FivefoldRepetition,
    FiftyMove,
    SeventyFiveMove,
    InsufficientMaterial,
    Resignation,
    Timeout,
    /// Flag fell, but the opponent could never have mated.
    TimeoutVsInsufficient,
    Agreement,
    /// A result tag read from PGN without a derivable reason.
    Imported,
    KingReachedHill,
    Explosion,
    AllPiecesCaptured,
    ThreeCheck,
}

impl Termination {
    pub const fn as_str(self) -> &'static str {
        match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::ThreefoldRepetition => "threefold_repetition",
            Termination::FivefoldRepetition => "fivefold_repetition",
            Termination::FiftyMove => "50move",
            Termination::SeventyFiveMove => "75move",
            Termination::InsufficientMaterial => "insufficient_material",
            Termination::Resignation => "resignation",
            Termination::Timeout => "timeout",
            Termination::TimeoutVsInsufficient => "timeoutvsinsufficient",
            Termination::Agreement => "agreement",
            Termination::Imported => "imported",
            Termination::KingReachedHill => "king_reached_hill",
            Termination::Explosion => "explosion",
            Termination::AllPiecesCaptured => "all_pieces_captured",
            Termination::ThreeCheck => "three_check",
        }
    }

    /// Template for the PGN `Termination` tag. `[WINNER]` and `[LOSER]` are
    /// replaced by player names; imported results have no template.
    pub const fn pgn_template(self) -> Option<&'static str> {
        Some(match self {
            Termination::Checkmate => "[WINNER] won by checkmate",
            Termination::Stalemate => "Game drawn by stalemate",
            Termination::ThreefoldRepetition => "Game drawn by threefold repetition",
            Termination::FivefoldRepetition => "Game drawn by fivefold repetition",
            Termination::FiftyMove => "Game drawn by the 50-move rule",
            Termination::SeventyFiveMove => "Game drawn by the 75-move rule",
            Termination::InsufficientMaterial => "Game drawn by insufficient material",
            Termination::Resignation => "[LOSER] resigned",
            Termination::Timeout => "[WINNER] won on time",
            Termination::TimeoutVsInsufficient => {
                "Game drawn by timeout vs insufficient material"
            }
            Termination::Agreement => "Game drawn by agreement",
            Termination::Imported => return None,
            Termination::KingReachedHill => "[WINNER] won by king reaching the hill",
            Termination::Explosion => "[WINNER] won by explosion",
            Termination::AllPiecesCaptured => "[WINNER] won by capturing all pieces",
            Termination::ThreeCheck => "[WINNER] won by three checks",
        })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the game is over, and if so who won and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStatus {
    pub game_over: bool,
    pub winner: Option<Color>,
    pub description: Option<Termination>,
}

impl GameStatus {
    pub const IN_PROGRESS: GameStatus = GameStatus {
        game_over: false,
        winner: None,
        description: None,
    };

    pub const fn won(winner: Color, description: Termination) -> Self {
        GameStatus {
            game_over: true,
            winner: Some(winner),
            description: Some(description),
        }
    }

    pub const fn drawn(description: Termination) -> Self {
        GameStatus {
            game_over: true,
            winner: None,
            description: Some(description),
        }
    }

    #[inline]
    pub fn is_draw(&self) -> bool {
        self.game_over && self.winner.is_none()
    }

    /// PGN result token.
    pub fn result_str(&self) -> &'static str {
        match (self.game_over, self.winner) {
            (false, _) => "*",
            (true, Some(Color::White)) => "1-0",
            (true, Some(Color::Black)) => "0-1",
            (true, None) => "1/2-1/2",
        }
    }

    /// The PGN `Termination` value with the given player names.
    pub fn termination_text(&self, white: &str, black: &str) -> Option<String> {
        let template = self.description?.pgn_template()?;
        let Some(winner) = self.winner else {
            return Some(template.to_string());
        };
        let (winner_name, loser_name) = match winner {
            Color::White => (white, black),
            Color::Black => (black, white),
        };
        Some(
            template
                .replace("[WINNER]", winner_name)
                .replace("[LOSER]", loser_name),
        )
    }
}
