//! Board state: piece placement plus everything castling and en passant need.

use std::ops::{Deref, DerefMut};

use chess_core::{
    encode_placement, CastlingSide, Color, FenParser, File, Piece, PieceKind, Square,
};

use crate::error::PositionError;

/// A board change for [`Position::test_position`]: a square and what to put on it.
pub type SquareChange = (Square, Option<Piece>);

/// Complete board state for one side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; 64],
    turn: Color,
    /// Last known king square per color. After an Atomic explosion this may
    /// point at an empty square.
    kings: [Option<Square>; 2],
    king_moved: [bool; 2],
    /// Indexed by color, then [`CastlingSide::index`].
    rook_moved: [[bool; 2]; 2],
    initial_king: [Option<Square>; 2],
    initial_rooks: [[Option<Square>; 2]; 2],
    double_forward: Option<Square>,
}

impl Position {
    /// An empty board with White to move and no castling history.
    pub fn empty() -> Self {
        Position {
            board: [None; 64],
            turn: Color::White,
            kings: [None; 2],
            king_moved: [false; 2],
            rook_moved: [[false; 2]; 2],
            initial_king: [None; 2],
            initial_rooks: [[None; 2]; 2],
            double_forward: None,
        }
    }

    /// Builds a position from a FEN string. The clocks are ignored.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        Self::from_record(&FenParser::parse(fen)?)
    }

    /// Builds a position from an already parsed FEN/EPD record.
    pub fn from_record(record: &FenParser) -> Result<Self, PositionError> {
        let mut position = Position::empty();
        for square in Square::all() {
            let Some(piece) = record.board[square.index() as usize] else {
                continue;
            };
            if piece.kind == PieceKind::King && position.kings[piece.color.index()].is_some() {
                return Err(PositionError::MultipleKings(piece.color));
            }
            if piece.kind == PieceKind::Pawn && square.rank() == piece.color.promotion_rank() {
                return Err(PositionError::PawnOnPromotionRank(piece.color, square));
            }
            position.set(square, Some(piece));
        }
        position.turn = record.active_color;
        position.set_initial_squares();

        for color in Color::ALL {
            let any_right = CastlingSide::ALL
                .iter()
                .any(|side| record.can_castle(color, *side));
            position.king_moved[color.index()] = !any_right;
            for side in CastlingSide::ALL {
                position.rook_moved[color.index()][side.index()] = !record.can_castle(color, side)
                    || position.initial_rooks[color.index()][side.index()].is_none();
            }
        }

        position.double_forward = record.en_passant.and_then(|target| {
            let mover = record.active_color.opposite();
            let pawn_square = target.offset(0, mover.pawn_direction())?;
            position
                .piece_at(pawn_square)
                .filter(|p| p.is(PieceKind::Pawn, mover))
                .map(|_| pawn_square)
        });
        Ok(position)
    }

    /// Decodes this position into a FEN record with zeroed clocks.
    pub fn to_record(&self) -> FenParser {
        FenParser {
            board: self.board,
            active_color: self.turn,
            castling: self.castling_string(),
            en_passant: self.en_passant_target(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Placement, turn, castling and en passant fields.
    pub fn bare_fen(&self) -> String {
        format!(
            "{} {} {} {}",
            encode_placement(&self.board),
            self.turn.to_fen_char(),
            self.castling_string(),
            self.en_passant_target()
                .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic())
        )
    }

    /// Records where kings and rooks stand now as their castling origins.
    ///
    /// The queenside rook is the outermost rook on the king's left along the
    /// back rank, the kingside rook the outermost on its right.
    pub fn set_initial_squares(&mut self) {
        for color in Color::ALL {
            let king = self
                .kings[color.index()]
                .filter(|sq| sq.rank() == color.back_rank())
                .filter(|sq| matches!(self.piece_at(*sq), Some(p) if p.is(PieceKind::King, color)));
            self.initial_king[color.index()] = king;
            self.initial_rooks[color.index()] = [None; 2];
            let Some(king) = king else {
                continue;
            };
            for file in File::ALL {
                let square = Square::new(file, color.back_rank());
                if !matches!(self.piece_at(square), Some(p) if p.is(PieceKind::Rook, color)) {
                    continue;
                }
                let rooks = &mut self.initial_rooks[color.index()];
                if file < king.file() {
                    if rooks[CastlingSide::QueenSide.index()].is_none() {
                        rooks[CastlingSide::QueenSide.index()] = Some(square);
                    }
                } else {
                    rooks[CastlingSide::KingSide.index()] = Some(square);
                }
            }
        }
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index() as usize]
    }

    /// Places or clears a square. Placing a king updates the king map;
    /// clearing a square never does.
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        if let Some(p) = piece {
            if p.kind == PieceKind::King {
                self.kings[p.color.index()] = Some(square);
            }
        }
        self.board[square.index() as usize] = piece;
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    #[inline]
    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    /// The king map entry for `color`, which may be stale after an explosion.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    /// The square of `color`'s king if the king is still standing there.
    pub fn live_king(&self, color: Color) -> Option<Square> {
        self.king_square(color)
            .filter(|sq| matches!(self.piece_at(*sq), Some(p) if p.is(PieceKind::King, color)))
    }

    /// Square of the pawn that just advanced two ranks, valid for one ply.
    #[inline]
    pub fn double_forward(&self) -> Option<Square> {
        self.double_forward
    }

    #[inline]
    pub fn set_double_forward(&mut self, square: Option<Square>) {
        self.double_forward = square;
    }

    /// The square a pawn skipped over, as written in FEN.
    pub fn en_passant_target(&self) -> Option<Square> {
        let pawn_square = self.double_forward?;
        let pawn = self.piece_at(pawn_square)?;
        pawn_square.offset(0, -pawn.color.pawn_direction())
    }

    #[inline]
    pub fn initial_king(&self, color: Color) -> Option<Square> {
        self.initial_king[color.index()]
    }

    #[inline]
    pub fn initial_rook(&self, color: Color, side: CastlingSide) -> Option<Square> {
        self.initial_rooks[color.index()][side.index()]
    }

    #[inline]
    pub fn king_has_moved(&self, color: Color) -> bool {
        self.king_moved[color.index()]
    }

    #[inline]
    pub fn rook_has_moved(&self, color: Color, side: CastlingSide) -> bool {
        self.rook_moved[color.index()][side.index()]
    }

    pub fn mark_king_moved(&mut self, color: Color) {
        self.king_moved[color.index()] = true;
    }

    pub fn mark_rook_moved(&mut self, color: Color, side: CastlingSide) {
        self.rook_moved[color.index()][side.index()] = true;
    }

    /// The castling side whose unmoved rook started on `square`, if any.
    pub fn rook_side_at(&self, color: Color, square: Square) -> Option<CastlingSide> {
        CastlingSide::ALL
            .into_iter()
            .find(|side| self.initial_rook(color, *side) == Some(square))
    }

    /// Whether the castling right still exists. This ignores whether castling
    /// is legal right now.
    pub fn castling_available(&self, color: Color, side: CastlingSide) -> bool {
        if self.king_has_moved(color) || self.rook_has_moved(color, side) {
            return false;
        }
        let king_home = self
            .initial_king(color)
            .and_then(|sq| self.piece_at(sq))
            .is_some_and(|p| p.is(PieceKind::King, color));
        let rook_home = self
            .initial_rook(color, side)
            .and_then(|sq| self.piece_at(sq))
            .is_some_and(|p| p.is(PieceKind::Rook, color));
        king_home && rook_home
    }

    /// The FEN castling field, e.g. "KQkq" or "-".
    pub fn castling_string(&self) -> String {
        let rights: String = Color::ALL
            .iter()
            .flat_map(|color| {
                [CastlingSide::KingSide, CastlingSide::QueenSide]
                    .into_iter()
                    .filter(|side| self.castling_available(*color, *side))
                    .map(|side| side.to_fen_char(*color))
            })
            .collect();
        if rights.is_empty() {
            "-".to_string()
        } else {
            rights
        }
    }

    /// Occupied squares of one color, a1 to h8.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    /// All occupied squares, a1 to h8.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn piece_count(&self) -> usize {
        self.board.iter().flatten().count()
    }

    /// Applies `changes` in order and returns a guard that undoes them.
    ///
    /// The guard dereferences to the modified position. Dropping it, on any
    /// exit path including unwinding, restores every changed square in
    /// reverse order along with the king map. Guards nest: an inner guard
    /// borrows the outer one and is always restored first.
    pub fn test_position(&mut self, changes: &[SquareChange]) -> TestPosition<'_> {
        let kings = self.kings;
        let mut undo = Vec::with_capacity(changes.len());
        for &(square, piece) in changes {
            undo.push((square, self.piece_at(square)));
            self.set(square, piece);
        }
        TestPosition {
            position: self,
            undo,
            kings,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::empty()
    }
}

/// Scoped hypothetical board state; see [`Position::test_position`].
#[derive(Debug)]
pub struct TestPosition<'a> {
    position: &'a mut Position,
    undo: Vec<SquareChange>,
    kings: [Option<Square>; 2],
}

impl Deref for TestPosition<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.position
    }
}

impl DerefMut for TestPosition<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for TestPosition<'_> {
    fn drop(&mut self) {
        while let Some((square, prior)) = self.undo.pop() {
            self.position.board[square.index() as usize] = prior;
        }
        self.position.kings = self.kings;
    }
}
