use crate::chess_board::ChessField;
use crate::rules_engine::Terminal;

/// Every way the rules engine can refuse its input. The state handed in is never modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    #[error("pawn move to {0} needs a promotion piece")]
    PromotionRequired(ChessField),

    #[error("invalid game state: {0}")]
    InvalidState(String),

    #[error("invalid FEN: {0}")]
    Fen(String),

    #[error("invalid move notation: '{0}'")]
    InvalidMoveText(String),

    #[error("the game is already over ({0})")]
    GameOver(Terminal),
}

impl RulesError {
    pub(crate) fn illegal(mv: impl ToString, reason: impl Into<String>) -> Self {
        RulesError::IllegalMove {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }
}
