//! Piece geometry and attack detection on a mailbox board.

use chess_core::{Color, Piece, PieceKind, Square};

use crate::Position;

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
pub const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Ray directions for a sliding piece; empty for everything else.
pub fn slider_directions(kind: PieceKind) -> &'static [(i8, i8)] {
    match kind {
        PieceKind::Rook => &ROOK_DIRECTIONS,
        PieceKind::Bishop => &BISHOP_DIRECTIONS,
        PieceKind::Queen => &QUEEN_DIRECTIONS,
        _ => &[],
    }
}

/// Walks from `from` in one direction, stopping at the first occupied square
/// (which is included).
pub fn ray(
    position: &Position,
    from: Square,
    (df, dr): (i8, i8),
) -> impl Iterator<Item = Square> + '_ {
    let mut current = Some(from);
    let mut blocked = false;
    std::iter::from_fn(move || {
        if blocked {
            return None;
        }
        let next = current?.offset(df, dr)?;
        current = Some(next);
        blocked = position.piece_at(next).is_some();
        Some(next)
    })
}

/// The eight surrounding squares that are on the board.
pub fn king_squares(square: Square) -> impl Iterator<Item = Square> {
    QUEEN_DIRECTIONS
        .into_iter()
        .filter_map(move |(df, dr)| square.offset(df, dr))
}

pub fn knight_squares(square: Square) -> impl Iterator<Item = Square> {
    KNIGHT_OFFSETS
        .into_iter()
        .filter_map(move |(df, dr)| square.offset(df, dr))
}

/// The diagonal squares a `color` pawn on `square` captures on.
pub fn pawn_capture_squares(color: Color, square: Square) -> impl Iterator<Item = Square> {
    [-1, 1]
        .into_iter()
        .filter_map(move |df| square.offset(df, color.pawn_direction()))
}

/// Pieces of color `by` that could capture on `square`.
///
/// Pawns count only through their diagonal captures; sliders are blocked by
/// the first occupied square on each ray.
pub fn attackers(position: &Position, square: Square, by: Color) -> Vec<(Square, Piece)> {
    let mut found = Vec::new();
    let mut push_if = |sq: Square, kinds: &[PieceKind]| {
        if let Some(piece) = position.piece_at(sq) {
            if piece.color == by && kinds.contains(&piece.kind) {
                found.push((sq, piece));
            }
        }
    };

    for direction in ROOK_DIRECTIONS {
        if let Some(last) = ray(position, square, direction).last() {
            push_if(last, &[PieceKind::Rook, PieceKind::Queen]);
        }
    }
    for direction in BISHOP_DIRECTIONS {
        if let Some(last) = ray(position, square, direction).last() {
            push_if(last, &[PieceKind::Bishop, PieceKind::Queen]);
        }
    }
    for sq in knight_squares(square) {
        push_if(sq, &[PieceKind::Knight]);
    }
    for sq in king_squares(square) {
        push_if(sq, &[PieceKind::King]);
    }
    // A `by` pawn attacks `square` from where a pawn of the other color on
    // `square` would capture.
    for sq in pawn_capture_squares(by.opposite(), square) {
        push_if(sq, &[PieceKind::Pawn]);
    }
    found
}

/// Returns true if any piece of color `by` could capture on `square`.
pub fn is_attacked_by(position: &Position, square: Square, by: Color) -> bool {
    !attackers(position, square, by).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn ray_stops_at_first_piece() {
        let position =
            Position::from_fen("4k3/8/8/8/4p3/8/8/4R1K1 w - - 0 1").unwrap();
        let squares: Vec<Square> = ray(&position, Square::E1, (0, 1)).collect();
        assert_eq!(squares, vec![sq("e2"), sq("e3"), sq("e4")]);
        let left: Vec<Square> = ray(&position, Square::E1, (-1, 0)).collect();
        assert_eq!(left.len(), 4);
    }

    #[test]
    fn corner_neighbours() {
        assert_eq!(king_squares(Square::A1).count(), 3);
        assert_eq!(knight_squares(Square::A1).count(), 2);
        assert_eq!(knight_squares(sq("d4")).count(), 8);
    }

    #[test]
    fn pawns_attack_diagonally_only() {
        let position = Position::from_fen("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1").unwrap();
        assert!(is_attacked_by(&position, sq("d4"), Color::White));
        assert!(is_attacked_by(&position, sq("f4"), Color::White));
        assert!(!is_attacked_by(&position, sq("e4"), Color::White));
    }

    #[test]
    fn sliders_are_blocked() {
        let position = Position::from_fen("4k3/8/8/8/8/8/4N3/4R1K1 w - - 0 1").unwrap();
        assert!(!is_attacked_by(&position, sq("e3"), Color::White));
        assert!(!is_attacked_by(&position, sq("e5"), Color::White));
        assert!(is_attacked_by(&position, sq("a1"), Color::White));
        assert!(is_attacked_by(&position, sq("d1"), Color::White));
    }

    #[test]
    fn attackers_lists_every_checker() {
        // Double check from rook and knight.
        let position = Position::from_fen("4k3/8/3N4/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        let checkers = attackers(&position, Square::E8, Color::White);
        assert_eq!(checkers.len(), 2);
        assert!(checkers.iter().any(|(s, p)| *s == Square::E1 && p.kind == PieceKind::Rook));
        assert!(checkers.iter().any(|(s, p)| *s == sq("d6") && p.kind == PieceKind::Knight));
    }
}
