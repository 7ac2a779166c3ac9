//! Opening classification hook.

use std::collections::HashMap;

/// An ECO code and opening name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub eco: String,
    pub name: String,
}

/// Names the opening of a game from its SAN move list.
pub trait OpeningBook {
    fn lookup(&self, moves: &[String]) -> Option<Opening>;
}

/// A book keyed by space-separated SAN lines, matching the longest line
/// that prefixes the game.
#[derive(Debug, Clone, Default)]
pub struct LineBook {
    lines: HashMap<String, Opening>,
}

impl LineBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line: &str, eco: &str, name: &str) {
        let key = line.split_whitespace().collect::<Vec<_>>().join(" ");
        self.lines.insert(
            key,
            Opening {
                eco: eco.to_string(),
                name: name.to_string(),
            },
        );
    }
}

impl OpeningBook for LineBook {
    fn lookup(&self, moves: &[String]) -> Option<Opening> {
        (1..=moves.len()).rev().find_map(|len| {
            let key = moves[..len]
                .iter()
                .map(|san| san.trim_end_matches(|c| c == '+' || c == '#'))
                .collect::<Vec<_>>()
                .join(" ");
            self.lines.get(&key).cloned()
        })
    }
}
