use super::{fen, ChessField, GameState, Move, MoveRequest};
use crate::rules_engine::RulesEngine;

/// Compares generated moves with the expected long algebraic strings, ignoring order.
pub fn assert_moves(generated: impl IntoIterator<Item = Move>, expected: &[&str]) {
    let mut generated: Vec<String> = generated.into_iter().map(|m| m.as_algebraic()).collect();
    let mut expected: Vec<String> = expected.iter().map(|m| m.to_string()).collect();
    generated.sort();
    expected.sort();
    assert_eq!(generated, expected);
}

/// A validated position.
pub fn board(fen: &str) -> GameState {
    GameState::from_fen(fen).unwrap()
}

/// A parsed but unvalidated position, for piece-level tests without kings.
pub fn unchecked_board(fen: &str) -> GameState {
    fen::from_fen(fen).unwrap()
}

pub fn field(algebraic: &str) -> ChessField {
    ChessField::from_algebraic(algebraic).unwrap()
}

/// Plays the given moves from `fen`, panicking on the first rejected one.
pub fn play(fen: &str, moves: &[&str]) -> GameState {
    moves.iter().fold(board(fen), |state, text| {
        let request = MoveRequest::from_algebraic(text).unwrap();
        RulesEngine::resolve_move(&state, request)
            .and_then(|mv| RulesEngine::apply_move(&state, &mv))
            .unwrap_or_else(|e| panic!("{} rejected: {}", text, e))
    })
}
