//! Pseudolegal destination generation and move execution.
//!
//! Generation here is purely geometric: it knows about occupancy, pawn
//! direction and castling availability, but not about leaving the king in
//! check. The legality filter lives in [`crate::rules`].

pub mod attacks;
pub mod perft;

use chess_core::{CastlingSide, Color, Move, Piece, PieceKind, Square};
use tracing::trace;

use crate::rules::RuleSet;
use crate::Position;

use attacks::{king_squares, knight_squares, ray, slider_directions};

/// Switches for [`pseudolegal_moves`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveGenOptions {
    /// Only destinations that capture something (diagonals for pawns).
    pub capture_only: bool,
    /// Add king castling destinations when castling is currently allowed.
    pub check_castle: bool,
}

impl MoveGenOptions {
    pub const CAPTURES: MoveGenOptions = MoveGenOptions {
        capture_only: true,
        check_castle: false,
    };
    pub const WITH_CASTLING: MoveGenOptions = MoveGenOptions {
        capture_only: false,
        check_castle: true,
    };
}

/// Squares the piece on `from` can reach ignoring check.
///
/// Captures of the enemy king are included; the legality filter rejects them.
pub fn pseudolegal_moves<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    from: Square,
    options: MoveGenOptions,
) -> Vec<Square> {
    let Some(piece) = position.piece_at(from) else {
        return Vec::new();
    };
    let board: &Position = position;
    let enemy = |sq: Square| board.piece_at(sq).is_some_and(|p| p.color != piece.color);
    let empty = |sq: Square| board.piece_at(sq).is_none();
    let reachable = |sq: Square| {
        if options.capture_only {
            enemy(sq)
        } else {
            empty(sq) || enemy(sq)
        }
    };

    let mut targets: Vec<Square> = match piece.kind {
        PieceKind::Pawn => pawn_moves(rules, board, from, piece, options.capture_only),
        PieceKind::Knight => knight_squares(from).filter(|sq| reachable(*sq)).collect(),
        PieceKind::King if rules.king_can_capture() => {
            king_squares(from).filter(|sq| reachable(*sq)).collect()
        }
        PieceKind::King if options.capture_only => Vec::new(),
        PieceKind::King => king_squares(from).filter(|sq| empty(*sq)).collect(),
        slider => slider_directions(slider)
            .iter()
            .flat_map(|dir| ray(board, from, *dir))
            .filter(|sq| reachable(*sq))
            .collect(),
    };

    if piece.kind == PieceKind::King && options.check_castle && !options.capture_only {
        for side in CastlingSide::ALL {
            let destination = side.king_destination(piece.color);
            if !targets.contains(&destination)
                && rules.can_castle(position, piece.color, side).is_ok()
            {
                targets.push(destination);
            }
        }
    }
    targets
}

fn pawn_moves<R: RuleSet + ?Sized>(
    rules: &R,
    position: &Position,
    from: Square,
    pawn: Piece,
    capture_only: bool,
) -> Vec<Square> {
    let direction = pawn.color.pawn_direction();
    let mut targets = Vec::with_capacity(4);

    if !capture_only {
        if let Some(one) = from.offset(0, direction).filter(|sq| position.piece_at(*sq).is_none()) {
            targets.push(one);
            if rules.pawn_can_double_step(position, from, pawn) {
                if let Some(two) = one
                    .offset(0, direction)
                    .filter(|sq| position.piece_at(*sq).is_none())
                {
                    targets.push(two);
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(target) = from.offset(df, direction) else {
            continue;
        };
        match position.piece_at(target) {
            Some(p) if p.color != pawn.color => targets.push(target),
            Some(_) => {}
            None => {
                let passed = from.offset(df, 0);
                let en_passant = passed.is_some()
                    && position.double_forward() == passed
                    && passed
                        .and_then(|sq| position.piece_at(sq))
                        .is_some_and(|p| p.is(PieceKind::Pawn, pawn.color.opposite()));
                if en_passant {
                    targets.push(target);
                }
            }
        }
    }
    targets
}

/// How a from/to pair is carried out on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    Normal { from: Square, to: Square },
    Castle { color: Color, side: CastlingSide },
    EnPassant { from: Square, to: Square },
}

impl MoveAction {
    /// Picks the handler from the destination: a king stepping two files
    /// from its initial square castles, a pawn moving diagonally onto an
    /// empty square captures en passant.
    pub fn classify(position: &Position, from: Square, to: Square) -> MoveAction {
        match position.piece_at(from) {
            Some(piece) if piece.kind == PieceKind::King => {
                let side = CastlingSide::from_king_destination(to, piece.color);
                match side {
                    Some(side)
                        if position.initial_king(piece.color) == Some(from)
                            && from.distance(to) == 2 =>
                    {
                        MoveAction::Castle {
                            color: piece.color,
                            side,
                        }
                    }
                    _ => MoveAction::Normal { from, to },
                }
            }
            Some(piece)
                if piece.kind == PieceKind::Pawn
                    && from.file() != to.file()
                    && position.piece_at(to).is_none() =>
            {
                MoveAction::EnPassant { from, to }
            }
            _ => MoveAction::Normal { from, to },
        }
    }
}

/// What committing a move did, for clocks and notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveEffects {
    pub capture: bool,
    pub pawn_move: bool,
    pub castle: bool,
    /// Set when a pawn reached its last rank and awaits a promotion choice.
    /// The turn does not pass until [`promote`] is called.
    pub promotion_square: Option<Square>,
}

impl MoveEffects {
    /// Pawn moves, captures and castling cannot be repeated.
    pub fn is_irreversible(&self) -> bool {
        self.capture || self.pawn_move || self.castle
    }
}

/// Commits an already validated move, including capture side effects.
pub fn apply_action<R: RuleSet + ?Sized>(
    rules: &R,
    position: &mut Position,
    action: MoveAction,
) -> MoveEffects {
    let mut effects = MoveEffects::default();
    let mover = match action {
        MoveAction::Normal { from, to } => {
            let Some(piece) = position.piece_at(from) else {
                return effects;
            };
            let captured = position.piece_at(to);
            if let Some(victim) = captured.filter(|p| p.kind == PieceKind::Rook) {
                if let Some(side) = position.rook_side_at(victim.color, to) {
                    position.mark_rook_moved(victim.color, side);
                }
            }
            match piece.kind {
                PieceKind::King => position.mark_king_moved(piece.color),
                PieceKind::Rook => {
                    if let Some(side) = position.rook_side_at(piece.color, from) {
                        position.mark_rook_moved(piece.color, side);
                    }
                }
                _ => {}
            }

            position.set(from, None);
            position.set(to, Some(piece.moved()));
            if captured.is_some() {
                explode(rules, position, to);
            }

            effects.capture = captured.is_some();
            effects.pawn_move = piece.kind == PieceKind::Pawn;
            let double_step = effects.pawn_move && from.rank().index().abs_diff(to.rank().index()) == 2;
            position.set_double_forward(double_step.then_some(to));
            if effects.pawn_move
                && to.rank() == piece.color.promotion_rank()
                && position.piece_at(to).is_some_and(|p| p.kind == PieceKind::Pawn)
            {
                effects.promotion_square = Some(to);
            }
            piece.color
        }
        MoveAction::Castle { color, side } => {
            let (Some(king_from), Some(rook_from)) =
                (position.initial_king(color), position.initial_rook(color, side))
            else {
                return effects;
            };
            let (Some(king), Some(rook)) = (position.piece_at(king_from), position.piece_at(rook_from))
            else {
                return effects;
            };
            position.set(king_from, None);
            position.set(rook_from, None);
            position.set(side.king_destination(color), Some(king.moved()));
            position.set(side.rook_destination(color), Some(rook.moved()));
            position.mark_king_moved(color);
            position.mark_rook_moved(color, side);
            position.set_double_forward(None);
            effects.castle = true;
            color
        }
        MoveAction::EnPassant { from, to } => {
            let (Some(pawn), Some(passed)) = (position.piece_at(from), position.double_forward())
            else {
                return effects;
            };
            position.set(from, None);
            position.set(passed, None);
            position.set(to, Some(pawn.moved()));
            explode(rules, position, to);
            position.set_double_forward(None);
            effects.capture = true;
            effects.pawn_move = true;
            pawn.color
        }
    };

    if effects.promotion_square.is_none() {
        position.set_turn(mover.opposite());
    }
    effects
}

fn explode<R: RuleSet + ?Sized>(rules: &R, position: &mut Position, square: Square) {
    let changes = rules.capture_changes(position, square);
    if !changes.is_empty() {
        trace!(%square, cleared = changes.len(), "capture side effects");
    }
    for (sq, piece) in changes {
        position.set(sq, piece);
    }
}

/// Replaces the pawn awaiting promotion and passes the turn.
pub fn promote(position: &mut Position, square: Square, kind: PieceKind) {
    if let Some(pawn) = position.piece_at(square) {
        position.set(
            square,
            Some(Piece {
                kind,
                color: pawn.color,
                has_moved: true,
                promoted: true,
            }),
        );
        position.set_turn(pawn.color.opposite());
    }
}

/// Plays a legal move on a bare position, promoting immediately if the
/// move names a piece.
pub fn make_move<R: RuleSet + ?Sized>(rules: &R, position: &mut Position, m: Move) -> MoveEffects {
    let action = MoveAction::classify(position, m.from, m.to);
    let effects = apply_action(rules, position, action);
    if let (Some(square), Some(kind)) = (effects.promotion_square, m.promotion) {
        promote(position, square, kind);
    }
    effects
}

/// Every legal move for the side to move, one entry per promotion choice.
pub fn legal_move_list<R: RuleSet + ?Sized>(rules: &R, position: &mut Position) -> Vec<Move> {
    let color = position.turn();
    let origins: Vec<(Square, Piece)> = position.pieces(color).collect();
    let mut moves = Vec::new();
    for (from, piece) in origins {
        for to in rules.legal_moves(position, from) {
            if piece.kind == PieceKind::Pawn && to.rank() == color.promotion_rank() {
                moves.extend(
                    PieceKind::PROMOTIONS
                        .iter()
                        .map(|kind| Move::with_promotion(from, to, *kind)),
                );
            } else {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}
