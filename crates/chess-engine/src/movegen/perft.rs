//! Perft (performance test) for move generator validation.
//!
//! Perft counts the number of leaf nodes at a given depth, which can be
//! compared against known-correct values to validate the move generator.

use crate::Position;

/// Counts the number of leaf nodes at the given depth.
pub fn perft(position: &Position, depth: u32) -> u64 {
    let mut scratch = position.clone();
    count(&mut scratch, depth)
}

fn count(position: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = position.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for m in &moves {
        position.apply_move(m);
        nodes += count(position, depth - 1);
        position.undo_move(m);
    }
    nodes
}

/// Perft with divide: node count below each root move, keyed by its UCI
/// text and sorted. Useful to find which move a generator gets wrong.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(String, u64)> {
    let mut scratch = position.clone();
    let mut results: Vec<(String, u64)> = position
        .legal_moves()
        .iter()
        .map(|m| {
            scratch.apply_move(m);
            let nodes = count(&mut scratch, depth.saturating_sub(1));
            scratch.undo_move(m);
            (m.to_uci(), nodes)
        })
        .collect();

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
