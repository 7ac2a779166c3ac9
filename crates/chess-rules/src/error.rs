//! Error types for position setup and move execution.

use chess_core::{Color, FenError, PieceKind, Square};
use thiserror::Error;

use crate::san::SanError;

/// Why a move, promotion or draw request was refused.
///
/// Every variant is produced before the position is touched, so a failed
/// call leaves the game exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("game is already over")]
    GameOver,

    #[error("must promote pawn at {0} before the next move")]
    PromotionPending(Square),

    #[error("it is {0}'s turn")]
    WrongTurn(Color),

    #[error("no piece at {0}")]
    NoPiece(Square),

    #[error("piece at {from} cannot navigate to {to}")]
    Unreachable { from: Square, to: Square },

    #[error("cannot capture king")]
    CannotCaptureKing,

    #[error("cannot move piece because player's king would be put in check")]
    KingInCheck,

    #[error("cannot move piece because player's king would explode")]
    KingWouldExplode,

    #[error("suicidal capture not allowed")]
    SuicidalCapture,

    #[error("cannot castle because the king has moved")]
    CastleKingMoved,

    #[error("cannot castle because the rook has moved")]
    CastleRookMoved,

    #[error("cannot castle because the initial king or rook square is unknown")]
    CastleSquaresUnknown,

    #[error("cannot castle because there are pieces between king and rook")]
    CastlePiecesBetween,

    #[error("cannot castle out of check")]
    CastleInCheck,

    #[error("cannot castle through or into check")]
    CastleThroughCheck,

    #[error("en passant must follow a double forward pawn advance")]
    EnPassantUnavailable,

    #[error("capturing pawn must be directly adjacent to captured pawn")]
    EnPassantNotAdjacent,

    #[error("no {0} pawns are able to capture by en passant")]
    NoEnPassantCapturer(Color),

    #[error("no pawn awaiting promotion at {0}")]
    NoPromotionPending(Square),

    #[error("cannot promote pawn to {0}")]
    InvalidPromotion(PieceKind),

    #[error("no draw can be claimed in this position")]
    NoDrawClaim,

    #[error("elapsed seconds are required when the game has a clock")]
    MissingClockUpdate,

    #[error(transparent)]
    Notation(#[from] SanError),
}

/// Errors raised while building a position from FEN or EPD.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("{0} has more than one king")]
    MultipleKings(Color),

    #[error("{0} pawn on its promotion rank at {1}")]
    PawnOnPromotionRank(Color, Square),
}

/// Errors raised while importing a PGN game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    #[error("invalid starting position: {0}")]
    Position(#[from] PositionError),

    #[error("unsupported variant: {0}")]
    UnknownVariant(String),

    #[error("cannot play {notation} at ply {ply}: {source}")]
    Move {
        ply: usize,
        notation: String,
        source: MoveError,
    },
}
