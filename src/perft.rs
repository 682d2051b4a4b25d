use log::trace;

use crate::chess_board::{GameState, Move};

/// Counts the leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(state: &GameState, depth: u8) -> u64 {
    let mut node_count = 0u64;

    if depth == 0 {
        return 1u64;
    }

    for mv in state.generate_legal_moves() {
        let mut new_state = state.clone();
        new_state.make_move(&mv);
        node_count += perft(&new_state, depth - 1);
    }
    node_count
}

/// Perft split by root move, sorted by move text. Empty for depth 0.
pub fn divide(state: &GameState, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let mut result_moves: Vec<(Move, u64)> = state
        .generate_legal_moves()
        .into_iter()
        .map(|mv| {
            let mut new_state = state.clone();
            new_state.make_move(&mv);
            let count = perft(&new_state, depth - 1);
            trace!("{}: {}", mv, count);
            (mv, count)
        })
        .collect();
    result_moves.sort_by_key(|(mv, _)| mv.as_algebraic());
    result_moves
}
