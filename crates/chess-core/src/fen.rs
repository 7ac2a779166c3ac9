//! FEN and EPD parsing and serialization.

use thiserror::Error;

use crate::{CastlingSide, Color, File, Piece, Rank, Square};

/// Errors that can occur when parsing FEN or EPD strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("invalid EPD operation: {0}")]
    InvalidEpdOperation(String),
}

/// The fields of a FEN record, decoded.
///
/// The rules engine turns this into its own position; this type only knows
/// about syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParser {
    /// Board contents indexed by [`Square::index`].
    pub board: [Option<Piece>; 64],
    pub active_color: Color,
    /// Castling availability in canonical order (e.g. "KQkq", "Kq", "-").
    pub castling: String,
    /// En passant target square (the square the pawn skipped).
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenParser {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a six-field FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let mut parsed = Self::parse_fields(parts[0], parts[1], parts[2], parts[3])?;
        parsed.halfmove_clock = parts[4]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;
        parsed.fullmove_number = parts[5]
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| FenError::InvalidFullmoveNumber(parts[5].to_string()))?;
        Ok(parsed)
    }

    /// Parses an EPD record: four FEN fields followed by `;`-terminated
    /// operations. `hmvc` and `fmvn` set the clocks; other opcodes are ignored.
    pub fn parse_epd(epd: &str) -> Result<Self, FenError> {
        let mut fields = epd.trim().splitn(5, char::is_whitespace);
        let mut next = || fields.next().filter(|f| !f.is_empty());
        let (Some(placement), Some(color), Some(castling), Some(ep)) =
            (next(), next(), next(), next())
        else {
            let count = epd.split_whitespace().count().min(3);
            return Err(FenError::InvalidPartCount(count));
        };
        let operations = next().unwrap_or("");

        let mut parsed = Self::parse_fields(placement, color, castling, ep)?;
        for operation in operations.split(';').map(str::trim).filter(|op| !op.is_empty()) {
            let (opcode, operand) = operation
                .split_once(char::is_whitespace)
                .map(|(code, arg)| (code, arg.trim()))
                .unwrap_or((operation, ""));
            match opcode {
                "hmvc" => {
                    parsed.halfmove_clock = operand
                        .parse()
                        .map_err(|_| FenError::InvalidHalfmoveClock(operand.to_string()))?
                }
                "fmvn" => {
                    parsed.fullmove_number = operand
                        .parse()
                        .ok()
                        .filter(|n| *n >= 1)
                        .ok_or_else(|| FenError::InvalidFullmoveNumber(operand.to_string()))?
                }
                _ if opcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {}
                _ => return Err(FenError::InvalidEpdOperation(operation.to_string())),
            }
        }
        Ok(parsed)
    }

    fn parse_fields(
        placement: &str,
        color: &str,
        castling: &str,
        ep: &str,
    ) -> Result<Self, FenError> {
        let board = Self::parse_placement(placement)?;

        let mut chars = color.chars();
        let active_color = match (chars.next().and_then(Color::from_fen_char), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(FenError::InvalidActiveColor(color.to_string())),
        };

        Self::validate_castling(castling)?;
        let en_passant = Self::parse_en_passant(ep)?;

        Ok(FenParser {
            board,
            active_color,
            castling: canonical_castling(castling),
            en_passant,
            halfmove_clock: 0,
            fullmove_number: 1,
        })
    }

    fn parse_placement(placement: &str) -> Result<[Option<Piece>; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut board = [None; 64];
        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = Rank::ALL[7 - row];
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    file += skip as u8;
                    continue;
                }
                let piece = Piece::from_fen_char(c).ok_or_else(|| {
                    FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c, rank
                    ))
                })?;
                if let Some(f) = File::from_index(file) {
                    board[Square::new(f, rank).index() as usize] = Some(piece);
                }
                file += 1;
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} has {} squares, expected 8",
                    rank, file
                )));
            }
        }
        Ok(board)
    }

    fn validate_castling(castling: &str) -> Result<(), FenError> {
        if castling == "-" {
            return Ok(());
        }
        if castling.is_empty() {
            return Err(FenError::InvalidCastlingRights(castling.to_string()));
        }

        let mut seen = Vec::with_capacity(4);
        for c in castling.chars() {
            if !"KQkq".contains(c) || seen.contains(&c) {
                return Err(FenError::InvalidCastlingRights(format!(
                    "invalid character '{}'",
                    c
                )));
            }
            seen.push(c);
        }
        Ok(())
    }

    fn parse_en_passant(ep: &str) -> Result<Option<Square>, FenError> {
        if ep == "-" {
            return Ok(None);
        }
        match Square::from_algebraic(ep) {
            Some(sq) if matches!(sq.rank(), Rank::R3 | Rank::R6) => Ok(Some(sq)),
            _ => Err(FenError::InvalidEnPassantSquare(ep.to_string())),
        }
    }

    /// Returns true if the castling field grants `side` to `color`.
    pub fn can_castle(&self, color: Color, side: CastlingSide) -> bool {
        self.castling.contains(side.to_fen_char(color))
    }

    /// The four position fields shared by FEN and EPD.
    pub fn bare_fen(&self) -> String {
        format!(
            "{} {} {} {}",
            encode_placement(&self.board),
            self.active_color.to_fen_char(),
            self.castling,
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic())
        )
    }

    /// Converts back to a six-field FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.bare_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Converts to an EPD record carrying the clocks as `hmvc`/`fmvn`.
    pub fn to_epd(&self) -> String {
        format!(
            "{} hmvc {}; fmvn {};",
            self.bare_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

/// Writes the piece-placement field for a board indexed by [`Square::index`].
pub fn encode_placement(board: &[Option<Piece>; 64]) -> String {
    let mut out = String::with_capacity(64);
    for (row, rank) in Rank::ALL.iter().rev().enumerate() {
        if row > 0 {
            out.push('/');
        }
        let mut empty = 0;
        for file in File::ALL {
            match board[Square::new(file, *rank).index() as usize] {
                Some(piece) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(piece.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
    }
    out
}

/// Sorts castling letters so uppercase comes first ("qK" becomes "Kq").
fn canonical_castling(castling: &str) -> String {
    if castling == "-" {
        return castling.to_string();
    }
    let mut letters: Vec<char> = castling.chars().collect();
    letters.sort_unstable();
    letters.into_iter().collect()
}
