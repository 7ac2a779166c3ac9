//! Zobrist keys for repetition detection.
//!
//! Two positions count as the same for repetition purposes when the same
//! pieces stand on the same squares, the same side is to move, the same
//! castling rights remain and the same en passant capture is actually
//! playable. Each of those contributes a key; the hash is their XOR.

use chess_core::{CastlingSide, Color, Piece, Square};

use crate::rules::RuleSet;
use crate::Position;

/// Key tables, built at compile time from a fixed xorshift sequence.
pub struct ZobristKeys {
    /// Indexed by [`piece_slot`], then square.
    pieces: [[u64; 64]; 12],
    black_to_move: u64,
    /// Indexed by color * 2 + castling side.
    castling: [u64; 4],
    en_passant_file: [u64; 8],
}

const fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

const fn piece_slot(piece: Piece) -> usize {
    piece.kind.index() * 2 + piece.color.index()
}

impl ZobristKeys {
    const fn generate() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[0u64; 64]; 12];
        let mut slot = 0;
        while slot < 12 {
            let mut square = 0;
            while square < 64 {
                state = xorshift(state);
                pieces[slot][square] = state;
                square += 1;
            }
            slot += 1;
        }

        state = xorshift(state);
        let black_to_move = state;

        let mut castling = [0u64; 4];
        let mut i = 0;
        while i < 4 {
            state = xorshift(state);
            castling[i] = state;
            i += 1;
        }

        let mut en_passant_file = [0u64; 8];
        let mut i = 0;
        while i < 8 {
            state = xorshift(state);
            en_passant_file[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant_file,
        }
    }

    #[inline]
    pub const fn piece(&self, piece: Piece, square: Square) -> u64 {
        self.pieces[piece_slot(piece)][square.index() as usize]
    }

    #[inline]
    pub const fn castling(&self, color: Color, side: CastlingSide) -> u64 {
        self.castling[color.index() * 2 + side.index()]
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::generate();

/// Hashes the parts of `position` that define a repetition.
///
/// The en passant file only counts when a capture there is legal, which
/// requires probing the position.
pub fn position_hash<R: RuleSet + ?Sized>(rules: &R, position: &mut Position) -> u64 {
    let mut hash = 0u64;
    for (square, piece) in position.occupied() {
        // `moved`/`promoted` flags do not distinguish positions.
        hash ^= ZOBRIST.piece(Piece::new(piece.kind, piece.color), square);
    }
    if position.turn() == Color::Black {
        hash ^= ZOBRIST.black_to_move;
    }
    for color in Color::ALL {
        for side in CastlingSide::ALL {
            if position.castling_available(color, side) {
                hash ^= ZOBRIST.castling(color, side);
            }
        }
    }
    if let Some(target) = position.en_passant_target() {
        if rules.can_en_passant(position, None).is_ok() {
            hash ^= ZOBRIST.en_passant_file[target.file().index() as usize];
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::make_move;
    use crate::rules::Standard;
    use chess_core::{FenParser, Move, PieceKind};

    fn hash(fen: &str) -> u64 {
        let mut position = Position::from_fen(fen).unwrap();
        position_hash(&Standard, &mut position)
    }

    #[test]
    fn keys_are_distinct() {
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let a1 = ZOBRIST.piece(pawn, Square::A1);
        assert_ne!(a1, 0);
        assert_ne!(a1, ZOBRIST.piece(pawn, Square::B1));
        assert_ne!(a1, ZOBRIST.piece(Piece::new(PieceKind::Pawn, Color::Black), Square::A1));
        assert_ne!(a1, ZOBRIST.piece(Piece::new(PieceKind::Knight, Color::White), Square::A1));
        assert_ne!(ZOBRIST.black_to_move, 0);
    }

    #[test]
    fn side_to_move_and_rights_matter() {
        let white = hash("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let black = hash("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");
        let fewer_rights = hash("r3k2r/8/8/8/8/8/8/R3K2R w Kkq - 0 1");
        assert_ne!(white, black);
        assert_ne!(white, fewer_rights);
    }

    #[test]
    fn unplayable_en_passant_is_ignored() {
        let with_target = hash("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        let without = hash("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(with_target, without);

        let playable = hash("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let stale = hash("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert_ne!(playable, stale);
    }

    #[test]
    fn knight_dance_returns_to_start_hash() {
        let mut position = Position::from_fen(FenParser::STARTPOS).unwrap();
        let start = position_hash(&Standard, &mut position);
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            make_move(&Standard, &mut position, Move::from_uci(uci).unwrap());
        }
        assert_eq!(position_hash(&Standard, &mut position), start);
    }
}
