//! Perft (performance test) for move generator validation.
//!
//! Perft counts the leaf nodes of the legal move tree at a given depth. The
//! totals are compared against published values to validate legality,
//! castling, en passant and promotion handling in one go.

use super::{legal_move_list, make_move};
use crate::rules::RuleSet;
use crate::Position;

/// Counts the number of leaf nodes at the given depth.
pub fn perft<R: RuleSet + ?Sized>(rules: &R, position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut scratch = position.clone();
    let moves = legal_move_list(rules, &mut scratch);

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for m in &moves {
        let mut next = position.clone();
        make_move(rules, &mut next, *m);
        nodes += perft(rules, &next, depth - 1);
    }
    nodes
}

/// Perft with divide: node count below each root move, sorted by UCI.
pub fn perft_divide<R: RuleSet + ?Sized>(
    rules: &R,
    position: &Position,
    depth: u32,
) -> Vec<(String, u64)> {
    let mut scratch = position.clone();
    let moves = legal_move_list(rules, &mut scratch);
    let mut results = Vec::with_capacity(moves.len());

    for m in &moves {
        let mut next = position.clone();
        make_move(rules, &mut next, *m);
        let nodes = if depth > 1 {
            perft(rules, &next, depth - 1)
        } else {
            1
        };
        results.push((m.to_uci(), nodes));
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
