//! Standard chess rules.
//!
//! The functions here are generic over the active rule set so that a
//! variant's hooks (check detection, capture side effects) take effect even
//! when the variant falls back to the standard algorithm.

use chess_core::{CastlingSide, Color, PieceKind, Square};
use tracing::trace;

use super::{RuleSet, Variant};
use crate::error::MoveError;
use crate::movegen::attacks::{attackers, is_attacked_by};
use crate::movegen::{MoveAction, MoveGenOptions};
use crate::{GameStatus, Position, Termination};

/// Standard chess (FIDE rules with Lichess insufficient material).
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl RuleSet for Standard {
    fn variant(&self) -> Variant {
        Variant::Standard
    }
}

pub fn is_checked_square(position: &Position, color: Color, square: Square) -> bool {
    is_attacked_by(position, square, color.opposite())
}

pub fn king_is_in_check<R: RuleSet + ?Sized>(
    rules: &R,
    position: &Position,
    color: Color,
) -> Option<bool> {
    let king = position.king_square(color)?;
    Some(rules.is_checked_square(position, color, king))
}

/// Rejects positions where `color`'s king exploded or stands in check.
pub fn verify_king_safe<R: RuleSet + ?Sized>(
    rules: &R,
    position: &Position,
    color: Color,
) -> Result<(), MoveError> {
    if rules.king_exploded(position, color) {
        return Err(MoveError::KingWouldExplode);
    }
    if rules.king_is_in_check(position, color) == Some(true) {
        return Err(MoveError::KingInCheck);
    }
    Ok(())
}

pub fn can_move_piece<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    from: Square,
    to: Square,
) -> Result<(), MoveError> {
    let piece = position.piece_at(from).ok_or(MoveError::NoPiece(from))?;
    if !rules
        .pseudolegal_moves(position, from, MoveGenOptions::default())
        .contains(&to)
    {
        return Err(MoveError::Unreachable { from, to });
    }
    let target = position.piece_at(to);
    if target.is_some_and(|p| p.kind == PieceKind::King) {
        return Err(MoveError::CannotCaptureKing);
    }
    if piece.kind == PieceKind::Pawn && from.file() != to.file() && target.is_none() {
        return rules.can_en_passant(position, Some(from)).map(|_| ());
    }

    let mut changes = vec![(from, None), (to, Some(piece.moved()))];
    if target.is_some() {
        changes.extend(rules.capture_changes(position, to));
    }
    let after = position.test_position(&changes);
    verify_king_safe(rules, &after, piece.color)
}

pub fn can_castle<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    color: Color,
    side: CastlingSide,
) -> Result<(), MoveError> {
    if position.king_has_moved(color) {
        return Err(MoveError::CastleKingMoved);
    }
    let (Some(king_from), Some(rook_from)) =
        (position.initial_king(color), position.initial_rook(color, side))
    else {
        return Err(MoveError::CastleSquaresUnknown);
    };
    if position.rook_has_moved(color, side) {
        return Err(MoveError::CastleRookMoved);
    }
    let king = position
        .piece_at(king_from)
        .filter(|p| p.is(PieceKind::King, color))
        .ok_or(MoveError::CastleKingMoved)?;
    let rook = position
        .piece_at(rook_from)
        .filter(|p| p.is(PieceKind::Rook, color))
        .ok_or(MoveError::CastleRookMoved)?;

    if king_from
        .between(rook_from)
        .into_iter()
        .any(|sq| position.piece_at(sq).is_some())
    {
        return Err(MoveError::CastlePiecesBetween);
    }
    let king_to = side.king_destination(color);
    let rook_to = side.rook_destination(color);
    for destination in [king_to, rook_to] {
        if destination != king_from
            && destination != rook_from
            && position.piece_at(destination).is_some()
        {
            return Err(MoveError::CastlePiecesBetween);
        }
    }

    if rules.king_is_in_check(position, color) == Some(true) {
        return Err(MoveError::CastleInCheck);
    }
    for square in king_from.between(king_to) {
        let passing = position.test_position(&[(king_from, None), (square, Some(king))]);
        if rules.king_is_in_check(&passing, color) == Some(true) {
            return Err(MoveError::CastleThroughCheck);
        }
    }
    let castled = position.test_position(&[
        (king_from, None),
        (rook_from, None),
        (king_to, Some(king.moved())),
        (rook_to, Some(rook.moved())),
    ]);
    if rules.king_is_in_check(&castled, color) == Some(true) {
        return Err(MoveError::CastleThroughCheck);
    }
    Ok(())
}

/// Pawns of `color` standing beside the pawn that just double-stepped.
pub fn en_passant_capturers(position: &Position, color: Color) -> Vec<Square> {
    let Some(passed) = position.double_forward() else {
        return Vec::new();
    };
    [-1, 1]
        .into_iter()
        .filter_map(|df| passed.offset(df, 0))
        .filter(|sq| {
            position
                .piece_at(*sq)
                .is_some_and(|p| p.is(PieceKind::Pawn, color))
        })
        .collect()
}

pub fn can_en_passant<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    capturer: Option<Square>,
) -> Result<Square, MoveError> {
    let passed_square = position
        .double_forward()
        .ok_or(MoveError::EnPassantUnavailable)?;
    let capturer = match capturer {
        Some(square) => square,
        None => {
            let turn = position.turn();
            let candidates = en_passant_capturers(position, turn);
            let mut last_error = MoveError::NoEnPassantCapturer(turn);
            for candidate in candidates {
                match can_en_passant(rules, position, Some(candidate)) {
                    Ok(square) => return Ok(square),
                    Err(e) => last_error = e,
                }
            }
            return Err(last_error);
        }
    };

    let pawn = position
        .piece_at(capturer)
        .ok_or(MoveError::NoPiece(capturer))?;
    if pawn.kind != PieceKind::Pawn {
        return Err(MoveError::EnPassantUnavailable);
    }
    let passed = position
        .piece_at(passed_square)
        .filter(|p| p.kind == PieceKind::Pawn && p.color != pawn.color)
        .ok_or(MoveError::EnPassantUnavailable)?;
    if capturer.rank() != passed_square.rank()
        || capturer.file().index().abs_diff(passed_square.file().index()) != 1
    {
        return Err(MoveError::EnPassantNotAdjacent);
    }
    let target = passed_square
        .offset(0, pawn.color.pawn_direction())
        .filter(|sq| position.piece_at(*sq).is_none())
        .ok_or(MoveError::EnPassantUnavailable)?;

    let mut changes = vec![
        (capturer, None),
        (passed_square, None),
        (target, Some(pawn.moved())),
    ];
    changes.extend(rules.capture_changes(position, target));
    let after = position.test_position(&changes);
    verify_king_safe(rules, &after, pawn.color).inspect_err(|e| {
        trace!(%capturer, captured = %passed, error = %e, "en passant rejected");
    })?;
    Ok(capturer)
}

pub fn legal_moves<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    from: Square,
) -> Vec<Square> {
    if position.piece_at(from).is_none() {
        return Vec::new();
    }
    let candidates = rules.pseudolegal_moves(position, from, MoveGenOptions::WITH_CASTLING);
    candidates
        .into_iter()
        .filter(|to| match MoveAction::classify(position, from, *to) {
            MoveAction::Castle { color, side } => rules.can_castle(position, color, side).is_ok(),
            _ => rules.can_move_piece(position, from, *to).is_ok(),
        })
        .collect()
}

/// Squares where a piece would stop every check on `color`'s king: the
/// checkers themselves plus, for sliders, the squares in between.
pub fn check_block_squares(position: &Position, color: Color) -> Vec<Square> {
    let Some(king) = position.king_square(color) else {
        return Vec::new();
    };
    let mut squares = Vec::new();
    for (square, piece) in attackers(position, king, color.opposite()) {
        squares.push(square);
        if piece.kind.is_slider() {
            squares.extend(square.between(king));
        }
    }
    squares
}

pub fn can_block_or_capture_check<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    color: Color,
) -> bool {
    for capturer in en_passant_capturers(position, color) {
        if rules.can_en_passant(position, Some(capturer)).is_ok() {
            return true;
        }
    }
    let targets = check_block_squares(position, color);
    if targets.is_empty() {
        return false;
    }
    let defenders: Vec<Square> = position
        .pieces(color)
        .filter(|(_, p)| p.kind != PieceKind::King)
        .map(|(sq, _)| sq)
        .collect();
    defenders.into_iter().any(|from| {
        rules
            .pseudolegal_moves(position, from, MoveGenOptions::default())
            .into_iter()
            .filter(|to| targets.contains(to))
            .any(|to| rules.can_move_piece(position, from, to).is_ok())
    })
}

pub fn king_can_escape_check<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    color: Color,
) -> bool {
    match position.live_king(color) {
        Some(king) => !rules.legal_moves(position, king).is_empty(),
        None => false,
    }
}

pub fn is_checkmate<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    known_in_check: &[Color],
) -> Option<GameStatus> {
    for color in Color::ALL {
        let in_check = known_in_check.contains(&color)
            || rules.king_is_in_check(position, color) == Some(true);
        if in_check
            && !can_block_or_capture_check(rules, position, color)
            && !king_can_escape_check(rules, position, color)
            && !rules.extra_check_escape(position, color)
        {
            return Some(GameStatus::won(color.opposite(), Termination::Checkmate));
        }
    }
    None
}

/// The side to move is not in check and has no legal move.
pub fn is_stalemate<R: RuleSet + ?Sized>(rules: &R, position: &mut Position) -> bool {
    let turn = position.turn();
    if rules.king_is_in_check(position, turn) == Some(true) {
        return false;
    }
    let origins: Vec<Square> = position.pieces(turn).map(|(sq, _)| sq).collect();
    origins
        .into_iter()
        .all(|from| rules.legal_moves(position, from).is_empty())
}

/// Whether `color` could ever deliver mate, by the Lichess definition.
pub fn has_sufficient_material(position: &Position, color: Color) -> bool {
    let own: Vec<PieceKind> = position.pieces(color).map(|(_, p)| p.kind).collect();
    let theirs: Vec<PieceKind> = position
        .pieces(color.opposite())
        .map(|(_, p)| p.kind)
        .collect();
    if own.len() > 3 {
        return true;
    }
    let count = |kinds: &[PieceKind], kind: PieceKind| kinds.iter().filter(|k| **k == kind).count();
    let has_any = |kinds: &[PieceKind], wanted: &[PieceKind]| kinds.iter().any(|k| wanted.contains(k));

    if has_any(&own, &[PieceKind::Rook, PieceKind::Pawn, PieceKind::Queen])
        || count(&own, PieceKind::Knight) + count(&own, PieceKind::Bishop) > 1
    {
        return true;
    }
    if own.contains(&PieceKind::Knight)
        && has_any(
            &theirs,
            &[PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop, PieceKind::Pawn],
        )
    {
        return true;
    }
    if own.contains(&PieceKind::Bishop) {
        if has_any(&theirs, &[PieceKind::Knight, PieceKind::Pawn]) {
            return true;
        }
        let mut bishops = position
            .occupied()
            .filter(|(_, p)| p.kind == PieceKind::Bishop)
            .map(|(sq, _)| sq.is_light());
        if let Some(first) = bishops.next() {
            return bishops.any(|light| light != first);
        }
    }
    false
}

/// Drawn when neither side can mate. Only small boards are examined.
pub fn insufficient_material(position: &Position) -> Option<GameStatus> {
    if position.piece_count() > 4 {
        return None;
    }
    let sufficient = Color::ALL
        .into_iter()
        .any(|color| has_sufficient_material(position, color));
    (!sufficient).then_some(GameStatus::drawn(Termination::InsufficientMaterial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::FenParser;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn startpos_is_quiet() {
        let mut pos = position(FenParser::STARTPOS);
        assert_eq!(Standard.king_is_in_check(&pos, Color::White), Some(false));
        assert_eq!(Standard.is_checkmate(&mut pos, &[]), None);
        assert!(!Standard.is_stalemate(&mut pos));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let mut pos = position("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
        assert_eq!(
            Standard.can_move_piece(&mut pos, sq("e2"), sq("d3")),
            Err(MoveError::KingInCheck)
        );
        assert!(Standard.legal_moves(&mut pos, sq("e2")).is_empty());
    }

    #[test]
    fn king_cannot_be_captured() {
        let mut pos = position("4k3/8/8/8/8/8/8/4RK2 w - - 0 1");
        assert_eq!(
            Standard.can_move_piece(&mut pos, Square::E1, Square::E8),
            Err(MoveError::CannotCaptureKing)
        );
    }

    #[test]
    fn unreachable_destination() {
        let mut pos = position(FenParser::STARTPOS);
        assert_eq!(
            Standard.can_move_piece(&mut pos, Square::A1, sq("a3")),
            Err(MoveError::Unreachable {
                from: Square::A1,
                to: sq("a3")
            })
        );
    }

    #[test]
    fn probing_leaves_position_untouched() {
        let mut pos = position("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = pos.clone();
        for (from, _) in before.pieces(Color::White) {
            Standard.legal_moves(&mut pos, from);
        }
        Standard.is_checkmate(&mut pos, &[]);
        assert_eq!(pos, before);
    }

    #[test]
    fn castling_checks() {
        let mut pos = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(Standard.can_castle(&mut pos, Color::White, CastlingSide::KingSide), Ok(()));
        assert_eq!(Standard.can_castle(&mut pos, Color::White, CastlingSide::QueenSide), Ok(()));

        let mut blocked = position("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert_eq!(
            Standard.can_castle(&mut blocked, Color::White, CastlingSide::QueenSide),
            Err(MoveError::CastlePiecesBetween)
        );

        let mut through = position("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1");
        assert_eq!(
            Standard.can_castle(&mut through, Color::White, CastlingSide::KingSide),
            Err(MoveError::CastleThroughCheck)
        );

        let mut in_check = position("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        assert_eq!(
            Standard.can_castle(&mut in_check, Color::White, CastlingSide::QueenSide),
            Err(MoveError::CastleInCheck)
        );

        let mut no_rights = position("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert_eq!(
            Standard.can_castle(&mut no_rights, Color::White, CastlingSide::KingSide),
            Err(MoveError::CastleKingMoved)
        );
    }

    #[test]
    fn queenside_b_file_attack_does_not_stop_castling() {
        let mut pos = position("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_eq!(Standard.can_castle(&mut pos, Color::White, CastlingSide::QueenSide), Ok(()));
    }

    #[test]
    fn en_passant_inference() {
        let mut pos = position("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(Standard.can_en_passant(&mut pos, None), Ok(sq("e5")));
        assert_eq!(
            Standard.can_en_passant(&mut pos, Some(sq("e1"))),
            Err(MoveError::EnPassantUnavailable)
        );

        let mut none = position("4k3/8/8/3p4/8/8/8/4K3 w - d6 0 1");
        assert_eq!(
            Standard.can_en_passant(&mut none, None),
            Err(MoveError::NoEnPassantCapturer(Color::White))
        );
    }

    #[test]
    fn en_passant_discovering_rank_check_is_illegal() {
        let mut pos = position("8/8/8/KPp4r/8/8/8/7k w - c6 0 1");
        assert_eq!(
            Standard.can_en_passant(&mut pos, Some(sq("b5"))),
            Err(MoveError::KingInCheck)
        );
    }

    #[test]
    fn back_rank_mate() {
        let mut pos = position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        assert_eq!(Standard.can_move_piece(&mut pos, Square::A1, Square::A8), Ok(()));
        let mut mated = position("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        assert_eq!(
            Standard.is_checkmate(&mut mated, &[]),
            Some(GameStatus::won(Color::White, Termination::Checkmate))
        );
    }

    #[test]
    fn check_can_be_blocked() {
        let mut pos = position("R5k1/5ppp/8/8/8/8/3r4/6K1 b - - 0 1");
        assert!(can_block_or_capture_check(&Standard, &mut pos, Color::Black));
        assert_eq!(Standard.is_checkmate(&mut pos, &[]), None);
    }

    #[test]
    fn en_passant_can_capture_checking_pawn() {
        // The d5 pawn gives check and can only be removed en passant.
        let mut pos = position("8/8/8/3pP3/4K3/8/8/k7 w - d6 0 1");
        assert_eq!(Standard.king_is_in_check(&pos, Color::White), Some(true));
        assert!(can_block_or_capture_check(&Standard, &mut pos, Color::White));
    }

    #[test]
    fn stalemate_detected() {
        let mut pos = position("8/8/8/8/8/kq6/8/K7 w - - 0 1");
        assert!(Standard.is_stalemate(&mut pos));
        assert_eq!(Standard.is_checkmate(&mut pos, &[]), None);
    }

    #[test]
    fn insufficient_material_cases() {
        let bare = position("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            insufficient_material(&bare),
            Some(GameStatus::drawn(Termination::InsufficientMaterial))
        );
        let knight = position("4k3/8/8/8/8/8/8/4KN2 w - - 0 1");
        assert!(insufficient_material(&knight).is_some());
        let same_color_bishops = position("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert!(insufficient_material(&same_color_bishops).is_some());
        let opposite_bishops = position("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert!(insufficient_material(&opposite_bishops).is_none());
        let pawn = position("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert!(insufficient_material(&pawn).is_none());
        let knight_vs_knight = position("4kn2/8/8/8/8/8/8/4KN2 w - - 0 1");
        assert!(insufficient_material(&knight_vs_knight).is_none());
    }

    #[test]
    fn lone_king_lacks_material() {
        let pos = position("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        assert!(has_sufficient_material(&pos, Color::White));
        assert!(!has_sufficient_material(&pos, Color::Black));
    }
}
