pub mod chess_board;
pub mod error;
pub mod game;
pub mod perft;
pub mod rules_engine;
pub mod ui;

pub use chess_board::{ChessField, Color, GameState, Move, MoveRequest, Piece, PieceType, Square, INITIAL_POSITION};
pub use error::RulesError;
pub use game::Game;
pub use rules_engine::{PositionHistory, RulesEngine, Terminal};
