//! Standard Algebraic Notation (SAN) parsing and generation.
//!
//! Notation is produced in two halves because a move that promotes is only
//! complete once the piece has been chosen: [`move_prefix`] is computed on
//! the position before the move, [`check_suffix`] on the position after it.
//! Examples: "e4", "Nf3", "Bxc6", "O-O", "e8=Q", "Nbd2", "R1e1", "Qh4#".

use std::fmt;

use chess_core::{CastlingSide, File, Move, PieceKind, Rank, Square};
use thiserror::Error;

use crate::movegen::{make_move, MoveAction};
use crate::rules::RuleSet;
use crate::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanError {
    #[error("empty move notation")]
    Empty,

    #[error("invalid move notation: {0}")]
    InvalidFormat(String),

    #[error("no legal move matches {0}")]
    NoMatchingMove(String),

    #[error("ambiguous move: {0}")]
    AmbiguousMove(String),
}

/// Piece letter, disambiguator, capture marker and destination of a
/// non-castling move, computed before the move is made.
pub fn move_prefix<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    from: Square,
    to: Square,
) -> String {
    let Some(piece) = position.piece_at(from) else {
        return to.to_algebraic();
    };
    let capture = position.piece_at(to).is_some()
        || matches!(
            MoveAction::classify(position, from, to),
            MoveAction::EnPassant { .. }
        );

    let mut san = String::with_capacity(6);
    match piece.kind.san_letter() {
        Some(letter) => {
            san.push(letter);
            san.push_str(&disambiguator(rules, position, from, to));
        }
        None if capture => san.push(from.file().to_char()),
        None => {}
    }
    if capture {
        san.push('x');
    }
    san.push_str(&to.to_algebraic());
    san
}

/// The shortest origin hint that separates `from` from every other piece of
/// the same kind that could also legally reach `to`.
fn disambiguator<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    from: Square,
    to: Square,
) -> String {
    let Some(piece) = position.piece_at(from) else {
        return String::new();
    };
    let others: Vec<Square> = position
        .pieces(piece.color)
        .filter(|(sq, p)| *sq != from && p.kind == piece.kind)
        .map(|(sq, _)| sq)
        .collect();
    let rivals: Vec<Square> = others
        .into_iter()
        .filter(|sq| rules.can_move_piece(position, *sq, to).is_ok())
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != from.file()) {
        from.file().to_char().to_string()
    } else if rivals.iter().all(|sq| sq.rank() != from.rank()) {
        from.rank().to_char().to_string()
    } else {
        from.to_algebraic()
    }
}

/// "+" for check, "#" for mate or a variant win, computed after the move
/// with the opponent to move.
pub fn check_suffix<R: RuleSet + ?Sized>(rules: &R, position: &mut Position) -> &'static str {
    if rules.variant_outcome(position).is_some() {
        return "#";
    }
    let opponent = position.turn();
    if rules.king_is_in_check(position, opponent) != Some(true) {
        return "";
    }
    if rules.is_checkmate(position, &[opponent]).is_some() {
        "#"
    } else {
        "+"
    }
}

/// Full SAN for a legal move, promotion letter included.
pub fn move_to_san<R: RuleSet + ?Sized>(rules: &R, position: &Position, m: Move) -> String {
    let mut before = position.clone();
    let mut san = match MoveAction::classify(&before, m.from, m.to) {
        MoveAction::Castle { side, .. } => side.san().to_string(),
        _ => move_prefix(rules, &mut before, m.from, m.to),
    };
    if let Some(kind) = m.promotion {
        san.push('=');
        san.push(kind.san_letter().unwrap_or('Q'));
    }
    let mut after = position.clone();
    make_move(rules, &mut after, m);
    san.push_str(check_suffix(rules, &mut after));
    san
}

/// A parsed SAN token, not yet matched against a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanMove {
    Castle(CastlingSide),
    Piece {
        kind: PieceKind,
        file: Option<File>,
        rank: Option<Rank>,
        to: Square,
        promotion: Option<PieceKind>,
        capture: bool,
    },
}

impl fmt::Display for SanMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SanMove::Castle(side) => f.write_str(side.san()),
            SanMove::Piece {
                kind,
                file,
                rank,
                to,
                promotion,
                capture,
            } => {
                if let Some(letter) = kind.san_letter() {
                    write!(f, "{}", letter)?;
                }
                if let Some(file) = file {
                    write!(f, "{}", file.to_char())?;
                }
                if let Some(rank) = rank {
                    write!(f, "{}", rank.to_char())?;
                }
                if capture {
                    f.write_str("x")?;
                }
                write!(f, "{}", to)?;
                if let Some(letter) = promotion.and_then(PieceKind::san_letter) {
                    write!(f, "={}", letter)?;
                }
                Ok(())
            }
        }
    }
}

/// Parses SAN, tolerating check marks, annotation glyphs and zeros in
/// castling.
pub fn parse_san(text: &str) -> Result<SanMove, SanError> {
    let san = text
        .trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    if san.is_empty() {
        return Err(SanError::Empty);
    }
    if !san.is_ascii() {
        return Err(SanError::InvalidFormat(text.to_string()));
    }
    match san {
        "O-O" | "0-0" => return Ok(SanMove::Castle(CastlingSide::KingSide)),
        "O-O-O" | "0-0-0" => return Ok(SanMove::Castle(CastlingSide::QueenSide)),
        _ => {}
    }

    let invalid = || SanError::InvalidFormat(text.to_string());
    let (kind, mut body) = match san.chars().next() {
        Some(c @ ('N' | 'B' | 'R' | 'Q' | 'K')) => (PieceKind::from_char(c).ok_or_else(invalid)?, &san[1..]),
        _ => (PieceKind::Pawn, san),
    };

    let mut promotion = None;
    if kind == PieceKind::Pawn {
        if let Some(last) = body.chars().last().filter(|c| c.is_ascii_uppercase()) {
            let piece = PieceKind::from_char(last)
                .filter(|k| k.is_promotion_target())
                .ok_or_else(invalid)?;
            promotion = Some(piece);
            body = body[..body.len() - 1].trim_end_matches('=');
        }
    }

    let capture = body.contains('x');
    let squares: String = body.chars().filter(|c| *c != 'x' && *c != '-').collect();
    if squares.len() < 2 {
        return Err(invalid());
    }
    let (hint, destination) = squares.split_at(squares.len() - 2);
    let to = Square::from_algebraic(destination).ok_or_else(invalid)?;
    let (file, rank) = match hint.as_bytes() {
        [] => (None, None),
        [c] => match (File::from_char(*c as char), Rank::from_char(*c as char)) {
            (Some(f), _) => (Some(f), None),
            (None, Some(r)) => (None, Some(r)),
            (None, None) => return Err(invalid()),
        },
        [f, r] => (
            Some(File::from_char(*f as char).ok_or_else(invalid)?),
            Some(Rank::from_char(*r as char).ok_or_else(invalid)?),
        ),
        _ => return Err(invalid()),
    };

    Ok(SanMove::Piece {
        kind,
        file,
        rank,
        to,
        promotion,
        capture,
    })
}

/// Finds the single legal move of the side to move matching `san`.
pub fn resolve_san<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    san: &SanMove,
) -> Result<Move, SanError> {
    let color = position.turn();
    let no_match = || SanError::NoMatchingMove(san.to_string());

    let (kind, file, rank, to, promotion) = match *san {
        SanMove::Castle(side) => {
            let king = position.live_king(color).ok_or_else(no_match)?;
            rules.can_castle(position, color, side).map_err(|_| no_match())?;
            return Ok(Move::new(king, side.king_destination(color)));
        }
        SanMove::Piece {
            kind,
            file,
            rank,
            to,
            promotion,
            ..
        } => (kind, file, rank, to, promotion),
    };

    let origins: Vec<Square> = position
        .pieces(color)
        .filter(|(sq, p)| {
            p.kind == kind
                && file.map_or(true, |f| sq.file() == f)
                && rank.map_or(true, |r| sq.rank() == r)
        })
        .map(|(sq, _)| sq)
        .collect();
    let mut matches = Vec::new();
    for from in origins {
        if matches!(
            MoveAction::classify(position, from, to),
            MoveAction::Castle { .. }
        ) {
            continue;
        }
        if rules.legal_moves(position, from).contains(&to) {
            matches.push(from);
        }
    }

    let from = match matches.as_slice() {
        [] => return Err(no_match()),
        [only] => *only,
        _ => return Err(SanError::AmbiguousMove(san.to_string())),
    };
    let promotes = kind == PieceKind::Pawn && to.rank() == color.promotion_rank();
    match (promotes, promotion) {
        (true, Some(piece)) => Ok(Move::with_promotion(from, to, piece)),
        (false, None) => Ok(Move::new(from, to)),
        _ => Err(no_match()),
    }
}

pub fn san_to_move<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    text: &str,
) -> Result<Move, SanError> {
    resolve_san(rules, position, &parse_san(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal_move_list;
    use crate::rules::{KingOfTheHill, Standard};
    use chess_core::FenParser;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn san(fen: &str, uci: &str) -> String {
        move_to_san(&Standard, &position(fen), Move::from_uci(uci).unwrap())
    }

    #[test]
    fn san_pawn_push() {
        assert_eq!(san(FenParser::STARTPOS, "e2e4"), "e4");
    }

    #[test]
    fn san_knight_move() {
        assert_eq!(san(FenParser::STARTPOS, "g1f3"), "Nf3");
    }

    #[test]
    fn san_pawn_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san(fen, "e4d5"), "exd5");
    }

    #[test]
    fn san_en_passant() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert_eq!(san(fen, "e5d6"), "exd6");
    }

    #[test]
    fn san_castling() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(san(fen, "e1g1"), "O-O");
        assert_eq!(san(fen, "e1c1"), "O-O-O");
    }

    #[test]
    fn san_promotion() {
        assert_eq!(san("8/P7/8/8/8/8/8/4K1k1 w - - 0 1", "a7a8q"), "a8=Q");
        assert_eq!(san("8/P7/8/8/8/8/8/4K1k1 w - - 0 1", "a7a8n"), "a8=N");
    }

    #[test]
    fn san_knight_disambiguation_file() {
        assert_eq!(san("8/8/8/8/8/8/8/1N1K1N1k w - - 0 1", "b1d2"), "Nbd2");
    }

    #[test]
    fn san_rook_disambiguation_rank() {
        assert_eq!(san("7k/8/8/R7/8/8/8/R3K3 w - - 0 1", "a1a3"), "R1a3");
    }

    #[test]
    fn san_full_square_disambiguation() {
        let fen = "k7/8/8/8/8/2Q1Q3/8/2Q1K3 w - - 0 1";
        assert_eq!(san(fen, "c3d2"), "Qc3d2");
    }

    #[test]
    fn san_pinned_rival_needs_no_disambiguation() {
        // The e2 knight is pinned to its king.
        let fen = "4r2k/8/8/8/8/8/2N1N3/4K3 w - - 0 1";
        assert_eq!(san(fen, "c2d4"), "Nd4");
    }

    #[test]
    fn san_check_and_mate() {
        assert_eq!(san("8/8/8/8/8/8/8/4K1Qk w - - 0 1", "g1h2"), "Qh2+");
        assert_eq!(san("6k1/5ppp/8/8/8/8/8/R3K3 w Q - 0 1", "a1a8"), "Ra8#");
    }

    #[test]
    fn san_hill_win_is_marked_as_mate() {
        let pos = position("4k3/8/8/8/8/4K3/8/8 w - - 0 1");
        let m = Move::new(sq("e3"), Square::E4);
        assert_eq!(move_to_san(&KingOfTheHill, &pos, m), "Ke4#");
    }

    #[test]
    fn parse_variants() {
        assert_eq!(parse_san("O-O+"), Ok(SanMove::Castle(CastlingSide::KingSide)));
        assert_eq!(parse_san("0-0-0"), Ok(SanMove::Castle(CastlingSide::QueenSide)));
        assert_eq!(
            parse_san("exd8=Q#"),
            Ok(SanMove::Piece {
                kind: PieceKind::Pawn,
                file: Some(File::E),
                rank: None,
                to: sq("d8"),
                promotion: Some(PieceKind::Queen),
                capture: true,
            })
        );
        assert_eq!(
            parse_san("Nf3!?"),
            Ok(SanMove::Piece {
                kind: PieceKind::Knight,
                file: None,
                rank: None,
                to: sq("f3"),
                promotion: None,
                capture: false,
            })
        );
        assert_eq!(parse_san(""), Err(SanError::Empty));
        assert!(parse_san("xyz").is_err());
        assert!(parse_san("e8=K").is_err());
        assert!(parse_san("Nabc3").is_err());
    }

    #[test]
    fn resolve_against_position() {
        let mut pos = position(FenParser::STARTPOS);
        assert_eq!(
            san_to_move(&Standard, &mut pos, "Nf3"),
            Ok(Move::new(sq("g1"), sq("f3")))
        );
        assert!(matches!(
            san_to_move(&Standard, &mut pos, "Ke2"),
            Err(SanError::NoMatchingMove(_))
        ));

        let mut twins = position("8/8/8/8/8/8/8/1N1K1N1k w - - 0 1");
        assert!(matches!(
            san_to_move(&Standard, &mut twins, "Nd2"),
            Err(SanError::AmbiguousMove(_))
        ));
        assert_eq!(
            san_to_move(&Standard, &mut twins, "Nfd2"),
            Ok(Move::new(sq("f1"), sq("d2")))
        );
    }

    #[test]
    fn resolve_castling_and_promotion() {
        let mut pos = position("r3k2r/P7/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(
            san_to_move(&Standard, &mut pos, "O-O-O"),
            Ok(Move::new(Square::E1, Square::C1))
        );
        assert_eq!(
            san_to_move(&Standard, &mut pos, "axb8=N"),
            Err(SanError::NoMatchingMove("axb8=N".to_string()))
        );
        assert!(san_to_move(&Standard, &mut pos, "a8").is_err());
        let mut open = position("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            san_to_move(&Standard, &mut open, "axb8=N"),
            Ok(Move::with_promotion(sq("a7"), sq("b8"), PieceKind::Knight))
        );
    }

    #[test]
    fn san_roundtrip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut pos = position(fen);
        for m in legal_move_list(&Standard, &mut pos) {
            let text = move_to_san(&Standard, &pos, m);
            let parsed = san_to_move(&Standard, &mut pos, &text).unwrap();
            assert_eq!(m, parsed, "roundtrip failed for {}", text);
        }
    }
}
