//! Full game management: turn order, notation, clocks and termination.
//!
//! A [`Game`] moves through three states:
//! - in progress
//! - awaiting a promotion choice after a pawn reached its last rank
//! - over, after which moves are refused (unless the config says otherwise)
//!
//! Every move is validated against a scratch simulation first, so a refused
//! move leaves the game untouched.

use std::collections::HashMap;

use chess_core::{CastlingSide, Color, FenParser, Move, PieceKind, Square};
use tracing::{debug, info, trace, warn};

use crate::clock::{format_clock, MoveClock};
use crate::config::RulesConfig;
use crate::error::{MoveError, PgnError, PositionError};
use crate::movegen::perft::perft;
use crate::movegen::{apply_action, legal_move_list, promote, MoveAction};
use crate::pgn::{self, tag_line, wrap_text, PgnOptions, TAG_ROSTER};
use crate::rules::{RuleSet, Variant};
use crate::san::{check_suffix, move_prefix, san_to_move, SanError};
use crate::zobrist::position_hash;
use crate::{GameStatus, Position, Termination};

/// Tags the exporter derives from the game itself.
const GENERATED_TAGS: [&str; 8] = [
    "Result",
    "SetUp",
    "FEN",
    "Variant",
    "Termination",
    "CurrentPosition",
    "ECO",
    "Opening",
];

/// Per-move options for [`Game::move_piece_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOptions {
    /// Let the piece move even if it is not its side's turn.
    pub ignore_turn: bool,
    /// Time spent on the move. Required when the game has a clock.
    pub seconds_elapsed: Option<f64>,
}

impl MoveOptions {
    pub fn timed(seconds_elapsed: f64) -> Self {
        MoveOptions {
            seconds_elapsed: Some(seconds_elapsed),
            ..Self::default()
        }
    }
}

/// A chess game under one rule set.
///
/// ```
/// use chess_rules::{Game, Termination};
///
/// let mut game = Game::standard();
/// for san in ["f3", "e5", "g4", "Qh4#"] {
///     game.play_san(san).unwrap();
/// }
/// assert_eq!(game.status().description, Some(Termination::Checkmate));
/// ```
#[derive(Debug)]
pub struct Game {
    rules: Box<dyn RuleSet>,
    config: RulesConfig,
    position: Position,
    /// SAN of every ply, in order.
    moves: Vec<String>,
    pending_promotion: Option<Square>,
    /// Cached once the game ends.
    status: GameStatus,
    fields: Vec<(String, String)>,
    halfmove_clock: u32,
    /// Occurrences per position hash since the last irreversible move.
    repetitions: HashMap<u64, u32>,
    initial_fen: Option<String>,
    moves_before_import: u32,
    black_moved_first: bool,
    clock: Option<Box<dyn MoveClock>>,
    /// Comments keyed by the number of plies played before them.
    annotations: HashMap<usize, String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::standard()
    }
}

impl Game {
    /// A game from the variant's usual starting position.
    pub fn new(variant: Variant) -> Self {
        let rules = variant.rules();
        let record = FenParser::parse(rules.starting_fen()).expect("starting FEN is valid");
        let position = Position::from_record(&record).expect("starting position is valid");
        Self::from_parts(rules, position, &record, None)
    }

    pub fn standard() -> Self {
        Self::new(Variant::Standard)
    }

    /// A game whose variant and adjudication come from `config`.
    pub fn from_config(config: RulesConfig) -> Self {
        Self::new(config.variant).with_config(config)
    }

    /// Replaces the adjudication options and re-evaluates the status, so
    /// it belongs right after construction. The variant is not changed.
    pub fn with_config(mut self, config: RulesConfig) -> Self {
        self.config = config;
        self.status = GameStatus::IN_PROGRESS;
        self.refresh_status();
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn MoveClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Starts from a six-field FEN.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if the FEN is malformed or describes an
    /// impossible position.
    pub fn from_fen(variant: Variant, fen: &str) -> Result<Self, PositionError> {
        let record = FenParser::parse(fen)?;
        let position = Position::from_record(&record)?;
        Ok(Self::from_parts(
            variant.rules(),
            position,
            &record,
            Some(fen.trim().to_string()),
        ))
    }

    /// Starts from an EPD record. `hmvc` and `fmvn` opcodes set the clocks.
    pub fn from_epd(variant: Variant, epd: &str) -> Result<Self, PositionError> {
        let record = FenParser::parse_epd(epd)?;
        let position = Position::from_record(&record)?;
        let fen = record.to_fen();
        Ok(Self::from_parts(variant.rules(), position, &record, Some(fen)))
    }

    fn from_parts(
        rules: Box<dyn RuleSet>,
        position: Position,
        record: &FenParser,
        initial_fen: Option<String>,
    ) -> Self {
        let mut game = Game {
            rules,
            config: RulesConfig::default(),
            black_moved_first: position.turn() == Color::Black,
            position,
            moves: Vec::new(),
            pending_promotion: None,
            status: GameStatus::IN_PROGRESS,
            fields: Vec::new(),
            halfmove_clock: record.halfmove_clock,
            repetitions: HashMap::new(),
            initial_fen,
            moves_before_import: record.fullmove_number.saturating_sub(1),
            clock: None,
            annotations: HashMap::new(),
        };
        game.record_position();
        game.refresh_status();
        game
    }

    /// Replays a PGN game: tags, an optional `FEN` start, the movetext and
    /// the result token.
    ///
    /// # Errors
    ///
    /// Returns [`PgnError`] for an unknown variant, a bad starting position
    /// or the first move that cannot be played.
    pub fn from_pgn(text: &str) -> Result<Self, PgnError> {
        let tags = pgn::parse_tags(text);
        let tag = |name: &str| {
            tags.iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let variant = match tag("Variant") {
            Some(name) => Variant::from_pgn_name(name)
                .ok_or_else(|| PgnError::UnknownVariant(name.to_string()))?,
            None => Variant::Standard,
        };
        let mut game = match tag("FEN") {
            Some(fen) => Game::from_fen(variant, fen)?,
            None => Game::new(variant),
        };
        for (name, value) in &tags {
            if !matches!(name.as_str(), "Result" | "SetUp" | "FEN" | "Variant") {
                game.set_field(name, value);
            }
        }

        let movetext = pgn::parse_movetext(text);
        for (index, san) in movetext.moves.iter().enumerate() {
            game.play_san(san).map_err(|source| {
                warn!(ply = index + 1, %san, error = %source, "unplayable PGN move");
                PgnError::Move {
                    ply: index + 1,
                    notation: san.clone(),
                    source,
                }
            })?;
        }
        for (ply, comment) in movetext.comments {
            game.annotate(ply, &comment);
        }

        if !game.status.game_over {
            match movetext.result.as_deref().or(tag("Result")) {
                Some("1-0") => game.end(GameStatus::won(Color::White, Termination::Imported)),
                Some("0-1") => game.end(GameStatus::won(Color::Black, Termination::Imported)),
                Some("1/2-1/2") => game.end(GameStatus::drawn(Termination::Agreement)),
                _ => {}
            }
        }
        Ok(game)
    }

    pub fn variant(&self) -> Variant {
        self.rules.variant()
    }

    pub fn rules(&self) -> &dyn RuleSet {
        &*self.rules
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// SAN of every ply played in this game.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn pending_promotion(&self) -> Option<Square> {
        self.pending_promotion
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        let plies = self.moves.len() as u32 + u32::from(self.black_moved_first);
        self.moves_before_import + plies / 2 + 1
    }

    pub fn is_check(&self) -> bool {
        self.rules.king_is_in_check(&self.position, self.position.turn()) == Some(true)
    }

    /// Legal destinations of the piece on `square`.
    pub fn legal_moves(&self, square: Square) -> Vec<Square> {
        let mut scratch = self.position.clone();
        self.rules.legal_moves(&mut scratch, square)
    }

    /// Every legal move of the side to move; empty while a promotion is
    /// pending or once the game is over.
    pub fn all_legal_moves(&self) -> Vec<Move> {
        if self.pending_promotion.is_some() || self.is_blocked() {
            return Vec::new();
        }
        let mut scratch = self.position.clone();
        legal_move_list(&*self.rules, &mut scratch)
    }

    /// Leaf count of the legal move tree below the current position.
    pub fn perft(&self, depth: u32) -> u64 {
        perft(&*self.rules, &self.position, depth)
    }

    /// Full FEN, including this game's clocks.
    pub fn fen(&self) -> String {
        self.record().to_fen()
    }

    pub fn epd(&self) -> String {
        self.record().to_epd()
    }

    fn record(&self) -> FenParser {
        let mut record = self.position.to_record();
        record.halfmove_clock = self.halfmove_clock;
        record.fullmove_number = self.fullmove_number();
        record
    }

    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<(), MoveError> {
        self.move_piece_with(from, to, MoveOptions::default())
    }

    /// Moves the piece on `from` to `to`. Castling is a king move of two
    /// files and en passant is the pawn's diagonal step.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] without touching the game if the move is
    /// refused.
    pub fn move_piece_with(
        &mut self,
        from: Square,
        to: Square,
        options: MoveOptions,
    ) -> Result<(), MoveError> {
        self.ensure_accepting(options)?;
        let piece = self.position.piece_at(from).ok_or(MoveError::NoPiece(from))?;
        let turn = self.position.turn();
        if piece.color != turn {
            if !options.ignore_turn {
                return Err(MoveError::WrongTurn(turn));
            }
            self.position.set_turn(piece.color);
        }

        let action = MoveAction::classify(&self.position, from, to);
        self.execute(action, options.seconds_elapsed)
            .inspect_err(|_| self.position.set_turn(turn))
    }

    /// Castles the side to move.
    pub fn castle(&mut self, side: CastlingSide) -> Result<(), MoveError> {
        self.castle_with(side, MoveOptions::default())
    }

    pub fn castle_with(
        &mut self,
        side: CastlingSide,
        options: MoveOptions,
    ) -> Result<(), MoveError> {
        self.ensure_accepting(options)?;
        let color = self.position.turn();
        self.execute(MoveAction::Castle { color, side }, options.seconds_elapsed)
    }

    /// Captures en passant with the pawn on `from`.
    pub fn en_passant(&mut self, from: Square, to: Square) -> Result<(), MoveError> {
        self.ensure_accepting(MoveOptions::default())?;
        match MoveAction::classify(&self.position, from, to) {
            MoveAction::EnPassant { .. } => self.move_piece(from, to),
            _ => Err(MoveError::EnPassantUnavailable),
        }
    }

    /// Resolves the pending promotion.
    ///
    /// # Errors
    ///
    /// [`MoveError::GameOver`] once the game has ended,
    /// [`MoveError::NoPromotionPending`] if no pawn waits on `square`, and
    /// [`MoveError::InvalidPromotion`] for pawns and kings.
    pub fn promote_pawn(&mut self, square: Square, kind: PieceKind) -> Result<(), MoveError> {
        if self.is_blocked() {
            return Err(MoveError::GameOver);
        }
        if self.pending_promotion != Some(square) {
            return Err(MoveError::NoPromotionPending(square));
        }
        if !kind.is_promotion_target() {
            return Err(MoveError::InvalidPromotion(kind));
        }
        promote(&mut self.position, square, kind);
        self.pending_promotion = None;
        if let (Some(last), Some(letter)) = (self.moves.last_mut(), kind.san_letter()) {
            last.push('=');
            last.push(letter);
        }
        self.finish_ply();
        Ok(())
    }

    /// Plays a coordinate move such as `e2e4` or `e7e8q`.
    pub fn play_uci(&mut self, uci: &str) -> Result<(), MoveError> {
        let m = Move::from_uci(uci).ok_or_else(|| SanError::InvalidFormat(uci.to_string()))?;
        self.play(m)
    }

    /// Plays a SAN move such as `Nbd7`, `O-O` or `exd8=Q+`.
    pub fn play_san(&mut self, san: &str) -> Result<(), MoveError> {
        self.ensure_accepting(MoveOptions::default())?;
        let m = san_to_move(&*self.rules, &mut self.position, san)?;
        self.play(m)
    }

    /// Plays a move, promoting in the same call when it names a piece.
    pub fn play(&mut self, m: Move) -> Result<(), MoveError> {
        let reaches_last_rank = self.position.piece_at(m.from).is_some_and(|p| {
            p.kind == PieceKind::Pawn && m.to.rank() == p.color.promotion_rank()
        });
        if reaches_last_rank != m.promotion.is_some() {
            return Err(SanError::InvalidFormat(m.to_uci()).into());
        }
        self.move_piece(m.from, m.to)?;
        match (self.pending_promotion, m.promotion) {
            (Some(square), Some(kind)) => self.promote_pawn(square, kind),
            _ => Ok(()),
        }
    }

    /// Plays every move of a movetext fragment such as `1. e4 e5 2. Nf3`.
    /// Moves before the first refused one stay played.
    pub fn submit_moves(&mut self, movetext: &str) -> Result<(), MoveError> {
        for san in pgn::parse_movetext(movetext).moves {
            self.play_san(&san)?;
        }
        Ok(())
    }

    fn is_blocked(&self) -> bool {
        self.config.block_if_game_over && self.status.game_over
    }

    fn ensure_accepting(&self, options: MoveOptions) -> Result<(), MoveError> {
        if self.is_blocked() {
            return Err(MoveError::GameOver);
        }
        if let Some(square) = self.pending_promotion {
            return Err(MoveError::PromotionPending(square));
        }
        if self.clock.is_some() && options.seconds_elapsed.is_none() {
            return Err(MoveError::MissingClockUpdate);
        }
        Ok(())
    }

    fn execute(
        &mut self,
        action: MoveAction,
        seconds_elapsed: Option<f64>,
    ) -> Result<(), MoveError> {
        let verdict = match action {
            MoveAction::Castle { color, side } => {
                self.rules.can_castle(&mut self.position, color, side)
            }
            MoveAction::Normal { from, to } | MoveAction::EnPassant { from, to } => {
                self.rules.can_move_piece(&mut self.position, from, to)
            }
        };
        if let Err(error) = verdict {
            trace!(?action, %error, "move refused");
            return Err(error);
        }
        self.commit(action, seconds_elapsed);
        Ok(())
    }

    fn commit(&mut self, action: MoveAction, seconds_elapsed: Option<f64>) {
        let mover = self.position.turn();
        let notation = match action {
            MoveAction::Castle { side, .. } => side.san().to_string(),
            MoveAction::Normal { from, to } | MoveAction::EnPassant { from, to } => {
                move_prefix(&*self.rules, &mut self.position, from, to)
            }
        };

        let effects = apply_action(&*self.rules, &mut self.position, action);
        if effects.capture || effects.pawn_move {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if effects.is_irreversible() {
            self.repetitions.clear();
        }
        self.moves.push(notation);

        let remaining = match (self.clock.as_mut(), seconds_elapsed) {
            (Some(clock), Some(seconds)) => clock.record(mover, seconds),
            _ => None,
        };
        if let Some(left) = remaining {
            self.annotate(self.moves.len(), &format_clock(left));
        }

        match effects.promotion_square {
            Some(square) => self.pending_promotion = Some(square),
            None => self.finish_ply(),
        }
        if remaining.is_some_and(|left| left <= 0.0) && !self.status.game_over {
            self.end(self.timeout_status(mover));
        }
    }

    fn finish_ply(&mut self) {
        let suffix = check_suffix(&*self.rules, &mut self.position);
        if let Some(last) = self.moves.last_mut() {
            last.push_str(suffix);
        }
        self.record_position();
        self.refresh_status();
        debug!(
            ply = self.moves.len(),
            san = self.moves.last().map(String::as_str).unwrap_or_default(),
            fen = %self.fen(),
            "move played"
        );
    }

    fn record_position(&mut self) {
        let hash = position_hash(&*self.rules, &mut self.position);
        *self.repetitions.entry(hash).or_insert(0) += 1;
    }

    /// How often the current position has occurred since the last
    /// irreversible move, this occurrence included.
    pub fn repetition_count(&self) -> u32 {
        let mut scratch = self.position.clone();
        let hash = position_hash(&*self.rules, &mut scratch);
        self.repetitions.get(&hash).copied().unwrap_or(0)
    }

    fn refresh_status(&mut self) {
        if self.status.game_over || self.pending_promotion.is_some() {
            return;
        }
        let status = self.evaluate_status();
        if status.game_over {
            debug!(result = status.result_str(), termination = ?status.description, "game over");
            self.status = status;
        }
    }

    fn evaluate_status(&mut self) -> GameStatus {
        if let Some(status) = self.rules.variant_outcome(&self.position) {
            return status;
        }
        if let Some(status) = self.rules.is_checkmate(&mut self.position, &[]) {
            return status;
        }
        if self.rules.is_stalemate(&mut self.position) {
            return GameStatus::drawn(Termination::Stalemate);
        }
        if self.config.check_for_insufficient_material {
            if let Some(status) = self.rules.insufficient_material(&self.position) {
                return status;
            }
        }
        let hash = position_hash(&*self.rules, &mut self.position);
        let repeated = self.repetitions.get(&hash).copied().unwrap_or(0);
        if self.config.arbiter_draw_after_threefold_repetition && repeated >= 3 {
            return GameStatus::drawn(Termination::ThreefoldRepetition);
        }
        if self.config.automatic_draw_after_fivefold_repetition
            && self.moves.len() >= 10
            && repeated >= 5
        {
            return GameStatus::drawn(Termination::FivefoldRepetition);
        }
        if self.config.arbiter_draw_after_100_halfmove_clock && self.halfmove_clock >= 100 {
            return GameStatus::drawn(Termination::FiftyMove);
        }
        if self.halfmove_clock >= 150 {
            return GameStatus::drawn(Termination::SeventyFiveMove);
        }
        GameStatus::IN_PROGRESS
    }

    fn end(&mut self, status: GameStatus) {
        info!(result = status.result_str(), termination = ?status.description, "game ended");
        self.status = status;
    }

    /// Whether threefold repetition or the 50-move rule can be claimed.
    pub fn can_claim_draw(&self) -> bool {
        !self.status.game_over && (self.halfmove_clock >= 100 || self.repetition_count() >= 3)
    }

    /// Claims a draw under the 50-move rule or threefold repetition.
    pub fn claim_draw(&mut self) -> Result<GameStatus, MoveError> {
        if self.status.game_over {
            return Err(MoveError::GameOver);
        }
        let status = if self.halfmove_clock >= 100 {
            GameStatus::drawn(Termination::FiftyMove)
        } else if self.repetition_count() >= 3 {
            GameStatus::drawn(Termination::ThreefoldRepetition)
        } else {
            return Err(MoveError::NoDrawClaim);
        };
        self.end(status);
        Ok(status)
    }

    /// Claims a draw if one is available, otherwise records a draw by
    /// agreement.
    pub fn draw(&mut self) -> Result<GameStatus, MoveError> {
        match self.claim_draw() {
            Err(MoveError::NoDrawClaim) => {
                let status = GameStatus::drawn(Termination::Agreement);
                self.end(status);
                Ok(status)
            }
            claimed => claimed,
        }
    }

    pub fn resign(&mut self, color: Color) -> Result<GameStatus, MoveError> {
        if self.status.game_over {
            return Err(MoveError::GameOver);
        }
        let status = GameStatus::won(color.opposite(), Termination::Resignation);
        self.end(status);
        Ok(status)
    }

    /// Ends the game because `color` ran out of time.
    pub fn timeout(&mut self, color: Color) -> Result<GameStatus, MoveError> {
        if self.status.game_over {
            return Err(MoveError::GameOver);
        }
        let status = self.timeout_status(color);
        self.end(status);
        Ok(status)
    }

    fn timeout_status(&self, color: Color) -> GameStatus {
        let opponent = color.opposite();
        if self.rules.has_sufficient_material(&self.position, opponent) {
            GameStatus::won(opponent, Termination::Timeout)
        } else {
            GameStatus::drawn(Termination::TimeoutVsInsufficient)
        }
    }

    /// Sets a PGN tag, replacing any earlier value.
    pub fn set_field(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attaches a comment after `ply` plies (0 is before the first move).
    pub fn annotate(&mut self, ply: usize, comment: &str) {
        self.annotations
            .entry(ply)
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(comment);
            })
            .or_insert_with(|| comment.to_string());
    }

    /// Move number label for the ply at `index`: `"12."` before a White
    /// move, `"12..."` before a Black one.
    pub fn move_label(&self, index: usize) -> String {
        let ply = index as u32 + u32::from(self.black_moved_first);
        let number = self.moves_before_import + ply / 2 + 1;
        if ply % 2 == 0 {
            format!("{number}.")
        } else {
            format!("{number}...")
        }
    }

    /// Movetext without the result token, e.g. `1. e4 e5 2. Nf3`.
    pub fn export_moves(&self, include_annotations: bool) -> String {
        let comment = |ply: usize| {
            include_annotations
                .then(|| self.annotations.get(&ply))
                .flatten()
        };
        let mut tokens = Vec::with_capacity(self.moves.len() * 2);
        let mut interrupted = false;
        if let Some(text) = comment(0) {
            tokens.push(format!("{{{text}}}"));
            interrupted = true;
        }
        for (index, san) in self.moves.iter().enumerate() {
            let label = self.move_label(index);
            if !label.ends_with("...") || index == 0 || interrupted {
                tokens.push(label);
            }
            tokens.push(san.clone());
            interrupted = false;
            if let Some(text) = comment(index + 1) {
                tokens.push(format!("{{{text}}}"));
                interrupted = true;
            }
        }
        tokens.join(" ")
    }

    /// Renders the game as PGN.
    pub fn export_pgn(&self, options: &PgnOptions<'_>) -> String {
        let mut out = String::new();
        for name in TAG_ROSTER {
            let fallback = if name == "Date" { "????.??.??" } else { "?" };
            out.push_str(&tag_line(name, self.field(name).unwrap_or(fallback)));
        }
        out.push_str(&tag_line("Result", self.status.result_str()));
        if let Some(fen) = &self.initial_fen {
            out.push_str(&tag_line("SetUp", "1"));
            out.push_str(&tag_line("FEN", fen));
        }
        if let Some(name) = self.variant().pgn_name() {
            out.push_str(&tag_line("Variant", name));
        }
        if options.include_termination {
            let white = self.field("White").unwrap_or("White");
            let black = self.field("Black").unwrap_or("Black");
            let termination = self.status.termination_text(white, black);
            if let Some(text) = termination.as_deref().or(self.field("Termination")) {
                out.push_str(&tag_line("Termination", text));
            }
        }
        if options.include_current_position {
            out.push_str(&tag_line("CurrentPosition", &self.fen()));
        }
        if let Some(opening) = options.opening_book.and_then(|book| book.lookup(&self.moves)) {
            out.push_str(&tag_line("ECO", &opening.eco));
            out.push_str(&tag_line("Opening", &opening.name));
        }
        for (name, value) in &self.fields {
            if !TAG_ROSTER.contains(&name.as_str()) && !GENERATED_TAGS.contains(&name.as_str()) {
                out.push_str(&tag_line(name, value));
            }
        }

        let moves = self.export_moves(options.include_annotations);
        let movetext = if moves.is_empty() {
            self.status.result_str().to_string()
        } else {
            format!("{} {}", moves, self.status.result_str())
        };
        out.push('\n');
        match options.wrap {
            Some(width) => out.push_str(&wrap_text(&movetext, width)),
            None => out.push_str(&movetext),
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::IncrementalClock;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn play(game: &mut Game, line: &str) {
        for san in line.split_whitespace() {
            game.play_san(san).unwrap();
        }
    }

    #[test]
    fn new_game() {
        let game = Game::standard();
        assert!(game.moves().is_empty());
        assert!(!game.status().game_over);
        assert!(!game.is_check());
        assert_eq!(game.fen(), FenParser::STARTPOS);
        assert_eq!(game.all_legal_moves().len(), 20);
    }

    #[test]
    fn play_uci_records_san() {
        let mut game = Game::standard();
        game.play_uci("e2e4").unwrap();
        game.play_uci("g8f6").unwrap();
        assert_eq!(game.moves(), ["e4", "Nf6"]);
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn illegal_move() {
        let mut game = Game::standard();
        assert_eq!(
            game.play_uci("e2e5"),
            Err(MoveError::Unreachable {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(game.move_piece(sq("e3"), sq("e4")), Err(MoveError::NoPiece(sq("e3"))));
        assert_eq!(game.fen(), FenParser::STARTPOS);
    }

    #[test]
    fn wrong_turn_unless_ignored() {
        let mut game = Game::standard();
        assert_eq!(
            game.move_piece(sq("e7"), sq("e5")),
            Err(MoveError::WrongTurn(Color::White))
        );
        let options = MoveOptions {
            ignore_turn: true,
            ..MoveOptions::default()
        };
        game.move_piece_with(sq("e7"), sq("e5"), options).unwrap();
        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.moves(), ["e5"]);
    }

    #[test]
    fn refused_ignore_turn_move_restores_turn() {
        let mut game = Game::standard();
        let options = MoveOptions {
            ignore_turn: true,
            ..MoveOptions::default()
        };
        assert!(game.move_piece_with(sq("e7"), sq("e4"), options).is_err());
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn checkmate_fools_mate() {
        let mut game = Game::standard();
        play(&mut game, "f3 e5 g4 Qh4");
        assert_eq!(game.status(), GameStatus::won(Color::Black, Termination::Checkmate));
        assert_eq!(game.moves()[3], "Qh4#");
        assert!(game.all_legal_moves().is_empty());
    }

    #[test]
    fn stalemate() {
        let game = Game::from_fen(Variant::Standard, "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::drawn(Termination::Stalemate));
    }

    #[test]
    fn threefold_repetition() {
        let mut game = Game::standard();
        play(&mut game, "Nf3 Nf6 Ng1 Ng8");
        assert_eq!(game.repetition_count(), 2);
        assert!(!game.can_claim_draw());
        assert_eq!(game.claim_draw(), Err(MoveError::NoDrawClaim));

        play(&mut game, "Nf3 Nf6 Ng1 Ng8");
        assert_eq!(game.repetition_count(), 3);
        assert!(game.can_claim_draw());
        assert!(!game.status().game_over);

        let status = game.claim_draw().unwrap();
        assert_eq!(status, GameStatus::drawn(Termination::ThreefoldRepetition));
        assert_eq!(game.status(), status);
    }

    #[test]
    fn threefold_claim_needs_the_repeated_position_on_the_board() {
        let mut game = Game::standard();
        play(&mut game, "Nf3 Nf6 Ng1 Ng8 Nf3 Nf6 Ng1 Ng8 Nc3");
        assert_eq!(game.repetition_count(), 1);
        assert!(!game.can_claim_draw());
        assert_eq!(game.claim_draw(), Err(MoveError::NoDrawClaim));
        assert!(!game.status().game_over);
    }

    #[test]
    fn arbiter_ends_threefold_automatically() {
        let config = RulesConfig {
            arbiter_draw_after_threefold_repetition: true,
            ..RulesConfig::default()
        };
        let mut game = Game::from_config(config);
        play(&mut game, "Nf3 Nf6 Ng1 Ng8 Nf3 Nf6 Ng1 Ng8");
        assert_eq!(
            game.status(),
            GameStatus::drawn(Termination::ThreefoldRepetition)
        );
    }

    #[test]
    fn fivefold_repetition_is_automatic() {
        let mut game = Game::standard();
        for _ in 0..4 {
            play(&mut game, "Nf3 Nf6 Ng1 Ng8");
        }
        assert_eq!(game.repetition_count(), 5);
        assert_eq!(
            game.status(),
            GameStatus::drawn(Termination::FivefoldRepetition)
        );
    }

    #[test]
    fn pawn_move_resets_repetitions() {
        let mut game = Game::standard();
        play(&mut game, "Nf3 Nf6 Ng1 Ng8 e4");
        assert_eq!(game.repetition_count(), 1);
        assert_eq!(game.halfmove_clock(), 0);
    }

    #[test]
    fn fifty_move_rule() {
        let mut game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/R3K2k w Q - 99 1").unwrap();
        game.move_piece(sq("a1"), sq("a2")).unwrap();
        assert_eq!(game.halfmove_clock(), 100);
        assert!(game.can_claim_draw());
        assert!(!game.status().game_over);

        let status = game.claim_draw().unwrap();
        assert_eq!(status.description, Some(Termination::FiftyMove));
    }

    #[test]
    fn seventy_five_move_rule_automatic() {
        let game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/R3K2k w Q - 150 1").unwrap();
        assert_eq!(
            game.status(),
            GameStatus::drawn(Termination::SeventyFiveMove)
        );
    }

    #[test]
    fn insufficient_material() {
        let game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert_eq!(
            game.status(),
            GameStatus::drawn(Termination::InsufficientMaterial)
        );

        let config = RulesConfig {
            check_for_insufficient_material: false,
            ..RulesConfig::default()
        };
        let game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/4K2k w - - 0 1")
            .unwrap()
            .with_config(config);
        assert!(!game.status().game_over);
    }

    #[test]
    fn resign() {
        let mut game = Game::standard();
        let status = game.resign(Color::White).unwrap();
        assert_eq!(status, GameStatus::won(Color::Black, Termination::Resignation));
        assert_eq!(game.resign(Color::Black), Err(MoveError::GameOver));
    }

    #[test]
    fn agree_draw() {
        let mut game = Game::standard();
        let status = game.draw().unwrap();
        assert_eq!(status, GameStatus::drawn(Termination::Agreement));
        assert!(game.status().is_draw());
    }

    #[test]
    fn cannot_move_after_game_over() {
        let mut game = Game::standard();
        game.resign(Color::White).unwrap();
        assert_eq!(game.play_san("e4"), Err(MoveError::GameOver));
        assert_eq!(game.move_piece(sq("e2"), sq("e4")), Err(MoveError::GameOver));
    }

    #[test]
    fn moves_allowed_after_game_over_when_unblocked() {
        let config = RulesConfig {
            block_if_game_over: false,
            ..RulesConfig::default()
        };
        let mut game = Game::standard().with_config(config);
        game.resign(Color::White).unwrap();
        game.play_san("e4").unwrap();
        assert_eq!(game.status().description, Some(Termination::Resignation));
    }

    #[test]
    fn timeout_against_bare_king_is_drawn() {
        let mut game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/R3K2k w Q - 0 1").unwrap();
        let status = game.timeout(Color::Black).unwrap();
        assert_eq!(status, GameStatus::won(Color::White, Termination::Timeout));

        let mut game = Game::from_fen(Variant::Standard, "8/8/8/8/8/8/8/R3K2k w Q - 0 1").unwrap();
        let status = game.timeout(Color::White).unwrap();
        assert_eq!(status, GameStatus::drawn(Termination::TimeoutVsInsufficient));
    }

    #[test]
    fn move_history() {
        let mut game = Game::standard();
        play(&mut game, "e4 e5 Nf3");
        assert_eq!(game.moves(), ["e4", "e5", "Nf3"]);
        assert_eq!(game.export_moves(false), "1. e4 e5 2. Nf3");
        assert_eq!(game.fullmove_number(), 2);
    }

    #[test]
    fn fen_tracks_clocks_and_en_passant() {
        let mut game = Game::standard();
        game.play_san("e4").unwrap();
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        play(&mut game, "e5 Nf3");
        assert_eq!(
            game.epd(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - hmvc 1; fmvn 2;"
        );
    }

    #[test]
    fn black_to_move_import_numbers_moves() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let mut game = Game::from_fen(Variant::Standard, fen).unwrap();
        play(&mut game, "e5 Nf3");
        assert_eq!(game.export_moves(false), "1... e5 2. Nf3");
        assert_eq!(game.fullmove_number(), 2);
        assert!(game.fen().ends_with(" 1 2"));
    }

    #[test]
    fn from_epd_reads_clock_opcodes() {
        let game = Game::from_epd(
            Variant::Standard,
            "4k3/8/8/8/8/8/4P3/4K3 w - - hmvc 7; fmvn 31;",
        )
        .unwrap();
        assert_eq!(game.halfmove_clock(), 7);
        assert_eq!(game.fullmove_number(), 31);
        assert_eq!(game.fen(), "4k3/8/8/8/8/8/4P3/4K3 w - - 7 31");
    }

    #[test]
    fn promotion_waits_for_choice() {
        let mut game = Game::from_fen(Variant::Standard, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        game.move_piece(sq("e7"), sq("e8")).unwrap();
        assert_eq!(game.pending_promotion(), Some(sq("e8")));
        assert_eq!(game.turn(), Color::White);
        assert!(game.all_legal_moves().is_empty());

        assert_eq!(
            game.move_piece(sq("e1"), sq("e2")),
            Err(MoveError::PromotionPending(sq("e8")))
        );
        assert_eq!(
            game.promote_pawn(sq("e8"), PieceKind::King),
            Err(MoveError::InvalidPromotion(PieceKind::King))
        );
        assert_eq!(
            game.promote_pawn(sq("e7"), PieceKind::Queen),
            Err(MoveError::NoPromotionPending(sq("e7")))
        );

        game.promote_pawn(sq("e8"), PieceKind::Queen).unwrap();
        assert_eq!(game.pending_promotion(), None);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.moves(), ["e8=Q"]);
    }

    #[test]
    fn uci_promotion_in_one_call() {
        let mut game = Game::from_fen(Variant::Standard, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(game.play_uci("e7e8").is_err());
        game.play_uci("e7e8n").unwrap();
        assert_eq!(game.moves(), ["e8=N"]);
        assert_eq!(game.turn(), Color::Black);
    }

    #[test]
    fn castle_by_side() {
        let mut game =
            Game::from_fen(Variant::Standard, "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        game.castle(CastlingSide::KingSide).unwrap();
        game.castle(CastlingSide::QueenSide).unwrap();
        assert_eq!(game.moves(), ["O-O", "O-O-O"]);
        assert_eq!(game.fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
        assert_eq!(
            game.castle(CastlingSide::QueenSide),
            Err(MoveError::CastleKingMoved)
        );
    }

    #[test]
    fn clock_annotations() {
        let mut game = Game::standard().with_clock(Box::new(IncrementalClock::new(60.0, 2.0)));
        assert_eq!(
            game.move_piece(sq("e2"), sq("e4")),
            Err(MoveError::MissingClockUpdate)
        );
        game.move_piece_with(sq("e2"), sq("e4"), MoveOptions::timed(5.0))
            .unwrap();
        game.move_piece_with(sq("e7"), sq("e5"), MoveOptions::timed(10.0))
            .unwrap();
        assert_eq!(
            game.export_moves(true),
            "1. e4 {[%clk 0:00:57]} 1... e5 {[%clk 0:00:52]}"
        );
        assert_eq!(game.export_moves(false), "1. e4 e5");
    }

    #[test]
    fn flag_fall_ends_the_game() {
        let mut game = Game::standard().with_clock(Box::new(IncrementalClock::new(10.0, 0.0)));
        game.move_piece_with(sq("e2"), sq("e4"), MoveOptions::timed(11.0))
            .unwrap();
        assert_eq!(game.status(), GameStatus::won(Color::Black, Termination::Timeout));
    }

    #[test]
    fn flag_fall_on_promotion_freezes_the_board() {
        let mut game = Game::from_fen(Variant::Standard, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1")
            .unwrap()
            .with_clock(Box::new(IncrementalClock::new(5.0, 0.0)));
        game.move_piece_with(sq("e7"), sq("e8"), MoveOptions::timed(10.0))
            .unwrap();
        assert_eq!(
            game.status(),
            GameStatus::drawn(Termination::TimeoutVsInsufficient)
        );

        assert_eq!(
            game.promote_pawn(sq("e8"), PieceKind::Queen),
            Err(MoveError::GameOver)
        );
        assert_eq!(game.moves(), ["e8"]);
        assert_eq!(
            game.position().piece_at(sq("e8")).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
    }

    #[test]
    fn every_variant_starts_from_a_valid_position() {
        for variant in Variant::ALL {
            let game = Game::new(variant);
            assert_eq!(game.fen(), variant.rules().starting_fen());
            assert!(!game.status().game_over);
        }
    }
}
