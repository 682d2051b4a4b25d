mod fen;
mod game_state;
mod model;
mod move_generation;
#[cfg(test)]
pub mod test_utils;
mod zobrist_hash;

pub use fen::INITIAL_POSITION;
pub use game_state::{castling_index, GameState, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE};
pub use model::{to_algebraic_square, ChessField, Color, Move, MoveRequest, Piece, PieceType, Square};
pub use move_generation::pseudo_legal_targets;
pub use zobrist_hash::{ZobristHash, ZOBRIST};
