//! Chess rules engine for standard chess and the Atomic, Horde and
//! King-of-the-Hill variants.
//!
//! This crate provides:
//! - [`Position`] - Mailbox board with kings, castling state and the scoped
//!   [`Position::test_position`] simulation guard
//! - [`RuleSet`] - Variant hooks for legality, check and game termination
//! - [`Game`] - Turn order, promotion, notation, draws and clocks
//! - SAN writing and reading, PGN import and export, Zobrist hashing
//!
//! # Architecture
//!
//! Legality is decided by simulation: a candidate move is applied through a
//! [`TestPosition`] guard, the mover's king is checked, and the guard puts
//! every square back when it drops. Variants change the answer by overriding
//! [`RuleSet`] hooks (what a capture does, which squares count as check,
//! which positions are won) rather than by duplicating the algorithms.
//!
//! # Example
//!
//! ```
//! use chess_rules::{Game, Termination, Variant};
//!
//! let mut game = Game::new(Variant::KingOfTheHill);
//! game.submit_moves("1. e3 e6 2. Ke2 Ke7 3. Kd3 Kd6 4. Kd4").unwrap();
//! assert_eq!(game.status().description, Some(Termination::KingReachedHill));
//! assert_eq!(game.moves().last().map(String::as_str), Some("Kd4#"));
//! ```

mod clock;
mod config;
mod error;
mod game;
pub mod movegen;
mod opening;
pub mod pgn;
mod position;
pub mod rules;
pub mod san;
mod status;
mod zobrist;

pub use clock::{format_clock, IncrementalClock, MoveClock};
pub use config::{ConfigError, RulesConfig};
pub use error::{MoveError, PgnError, PositionError};
pub use game::{Game, MoveOptions};
pub use movegen::perft::{perft, perft_divide};
pub use opening::{LineBook, Opening, OpeningBook};
pub use pgn::PgnOptions;
pub use position::{Position, SquareChange, TestPosition};
pub use rules::{RuleSet, Variant};
pub use san::{move_to_san, san_to_move, SanError};
pub use status::{GameStatus, Termination};
pub use zobrist::{position_hash, ZobristKeys, ZOBRIST};
