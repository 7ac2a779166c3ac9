//! Portable Game Notation: tag pairs, movetext tokens and line wrapping.
//!
//! Only the text handling lives here. Replaying moves and rendering a game
//! is done by [`Game::from_pgn`](crate::Game::from_pgn) and
//! [`Game::export_pgn`](crate::Game::export_pgn).

use crate::opening::OpeningBook;

/// The seven-tag roster, minus `Result`, which is derived from the game.
pub const TAG_ROSTER: [&str; 6] = ["Event", "Site", "Date", "Round", "White", "Black"];

/// Result tokens that may end the movetext.
pub const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// What to include when exporting.
#[derive(Clone, Copy)]
pub struct PgnOptions<'a> {
    /// Wrap movetext at this many columns.
    pub wrap: Option<usize>,
    /// Emit `{...}` comments, including clock annotations.
    pub include_annotations: bool,
    pub include_termination: bool,
    /// Add a `CurrentPosition` tag with the final FEN.
    pub include_current_position: bool,
    pub opening_book: Option<&'a dyn OpeningBook>,
}

impl Default for PgnOptions<'_> {
    fn default() -> Self {
        PgnOptions {
            wrap: None,
            include_annotations: true,
            include_termination: true,
            include_current_position: false,
            opening_book: None,
        }
    }
}

/// Movetext split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Movetext {
    /// SAN tokens in order, move numbers and glyphs removed.
    pub moves: Vec<String>,
    /// Comments keyed by the number of moves played before them.
    pub comments: Vec<(usize, String)>,
    pub result: Option<String>,
}

/// Reads every `[Name "Value"]` tag pair, in order.
pub fn parse_tags(pgn: &str) -> Vec<(String, String)> {
    pgn.lines()
        .filter_map(|line| {
            let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
            let (name, value) = inner.split_once(char::is_whitespace)?;
            let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
            Some((name.to_string(), value.replace("\\\"", "\"")))
        })
        .collect()
}

/// Splits the movetext that follows the tag section.
///
/// Comments are kept, while variations, numeric annotation glyphs, move
/// numbers and `!`/`?` suffixes are dropped.
pub fn parse_movetext(pgn: &str) -> Movetext {
    let body: String = pgn
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.starts_with('%') && !line.starts_with('[')
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut movetext = Movetext::default();
    let mut chars = body.chars().peekable();
    let mut token = String::new();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                push_token(&mut movetext, &mut token, depth);
                let comment: String = chars.by_ref().take_while(|c| *c != '}').collect();
                if depth == 0 {
                    movetext
                        .comments
                        .push((movetext.moves.len(), comment.trim().to_string()));
                }
            }
            ';' => {
                push_token(&mut movetext, &mut token, depth);
                let comment: String = chars.by_ref().take_while(|c| *c != '\n').collect();
                if depth == 0 {
                    movetext
                        .comments
                        .push((movetext.moves.len(), comment.trim().to_string()));
                }
            }
            '(' => {
                push_token(&mut movetext, &mut token, depth);
                depth += 1;
            }
            ')' => {
                push_token(&mut movetext, &mut token, depth);
                depth = depth.saturating_sub(1);
            }
            c if c.is_whitespace() => push_token(&mut movetext, &mut token, depth),
            c => token.push(c),
        }
    }
    push_token(&mut movetext, &mut token, depth);
    movetext
}

fn push_token(movetext: &mut Movetext, token: &mut String, depth: usize) {
    let raw = std::mem::take(token);
    if depth > 0 || raw.is_empty() || raw.starts_with('$') {
        return;
    }
    if RESULT_TOKENS.contains(&raw.as_str()) {
        movetext.result = Some(raw);
        return;
    }
    // "12." and "12..." precede a move, "12.e4" is glued to one.
    let digits = raw.len() - raw.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let san = if digits > 0 && raw[digits..].starts_with('.') {
        raw[digits..].trim_start_matches('.')
    } else {
        raw.as_str()
    };
    let san = san.trim_end_matches(['!', '?']);
    if !san.is_empty() {
        movetext.moves.push(san.to_string());
    }
}

/// Greedy word wrap: breaks at spaces so no line exceeds `width`, unless a
/// single word is longer.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / width.max(1));
    let mut line_len = 0;
    for word in text.split_whitespace() {
        if line_len > 0 && line_len + 1 + word.len() > width {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word.len();
    }
    out
}

/// A `[Name "Value"]` line with quotes escaped.
pub fn tag_line(name: &str, value: &str) -> String {
    format!("[{} \"{}\"]\n", name, value.replace('"', "\\\""))
}
