use std::fmt;

use log::{debug, warn};

use crate::chess_board::{pseudo_legal_targets, ChessField, Color, GameState, Move, MoveRequest, PieceType};
use crate::error::RulesError;

/// A position with this many occurrences is drawn by repetition.
pub const REPETITION_LIMIT: u8 = 3;
/// Half-moves without capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Ongoing,
    /// Carries the side that delivered mate.
    Checkmate(Color),
    Stalemate,
    DrawFiftyMove,
    DrawInsufficientMaterial,
    DrawRepetition,
}

impl Terminal {
    pub fn is_over(&self) -> bool {
        *self != Terminal::Ongoing
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            Terminal::Checkmate(color) => Some(*color),
            _ => None,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Ongoing => write!(f, "game in progress"),
            Terminal::Checkmate(winner) => write!(f, "checkmate, {} wins", winner),
            Terminal::Stalemate => write!(f, "stalemate"),
            Terminal::DrawFiftyMove => write!(f, "draw by the fifty-move rule"),
            Terminal::DrawInsufficientMaterial => write!(f, "draw by insufficient material"),
            Terminal::DrawRepetition => write!(f, "draw by threefold repetition"),
        }
    }
}

/// Anything that knows how often a position has occurred in the current game.
pub trait PositionHistory {
    /// Number of times the position with `hash` has been reached, the current one included.
    fn repetitions(&self, hash: u64) -> u8;
}

impl PositionHistory for [u64] {
    fn repetitions(&self, hash: u64) -> u8 {
        self.iter().filter(|h| **h == hash).count().min(u8::MAX as usize) as u8
    }
}

impl PositionHistory for Vec<u64> {
    fn repetitions(&self, hash: u64) -> u8 {
        self.as_slice().repetitions(hash)
    }
}

/// Stateless entry point to the rules. Every operation takes the position it
/// works on and leaves it untouched.
pub struct RulesEngine;

impl RulesEngine {
    pub fn generate_legal_moves(state: &GameState) -> Vec<Move> {
        state.generate_legal_moves()
    }

    pub fn pseudo_legal_targets(kind: PieceType, color: Color, from: ChessField, state: &GameState) -> Vec<Move> {
        pseudo_legal_targets(kind, color, from, state)
    }

    /// Plays a legal move and returns the resulting position.
    pub fn apply_move(state: &GameState, mv: &Move) -> Result<GameState, RulesError> {
        if !state.generate_legal_moves().contains(mv) {
            warn!("rejected {} in {}", mv, state.to_fen());
            return Err(RulesError::illegal(mv, "not a legal move in this position"));
        }
        let mut next = state.clone();
        next.make_move(mv);
        debug!("{} {} -> {}", state.active_color(), mv, next.to_fen());
        Ok(next)
    }

    /// Finds the legal move a presentation layer asked for.
    pub fn resolve_move(state: &GameState, request: MoveRequest) -> Result<Move, RulesError> {
        let reject = |reason: String| {
            warn!("rejected {} in {}: {}", request, state.to_fen(), reason);
            RulesError::illegal(request, reason)
        };

        if !request.from.is_on_board() || !request.to.is_on_board() {
            return Err(reject("square off the board".to_string()));
        }

        let piece = state
            .piece_at(request.from)
            .ok_or_else(|| reject(format!("no piece on {}", request.from)))?;
        if piece.color != state.active_color() {
            return Err(reject(format!("it is {}'s turn", state.active_color())));
        }

        let candidates: Vec<Move> = pseudo_legal_targets(piece.kind, piece.color, request.from, state)
            .into_iter()
            .filter(|m| m.to == request.to)
            .collect();
        let Some(first) = candidates.first() else {
            return Err(reject(format!("the {} on {} cannot reach {}", piece.kind, request.from, request.to)));
        };
        if Self::leaves_king_attacked(state, first) {
            return Err(reject("the move would leave the king in check".to_string()));
        }

        let promoting = candidates.iter().any(|m| m.promotion.is_some());
        match (promoting, request.promotion) {
            (true, None) => {
                debug!("{} needs a promotion piece", request);
                Err(RulesError::PromotionRequired(request.to))
            }
            (false, Some(_)) => Err(reject("only a pawn reaching the last rank can promote".to_string())),
            (_, choice) => candidates
                .into_iter()
                .find(|m| m.promotion == choice)
                .ok_or_else(|| reject("a pawn cannot promote to that piece".to_string())),
        }
    }

    fn leaves_king_attacked(state: &GameState, mv: &Move) -> bool {
        let mut next = state.clone();
        next.make_move(mv);
        next.is_king_attacked(mv.moved_piece.color)
    }

    pub fn is_in_check(state: &GameState, color: Color) -> bool {
        state.is_king_attacked(color)
    }

    /// Every square `color` attacks, occupied or not.
    pub fn attacked_squares(state: &GameState, color: Color) -> Vec<ChessField> {
        ChessField::all()
            .filter(|field| state.is_square_attacked_by_color(*field, color))
            .collect()
    }

    /// Decides whether the game is over. Mate and stalemate are checked first,
    /// then the fifty-move rule, material and, given a history, repetition.
    pub fn classify_terminal(state: &GameState, history: Option<&dyn PositionHistory>) -> Terminal {
        let mover = state.active_color();
        if state.generate_legal_moves().is_empty() {
            return if state.is_king_attacked(mover) {
                Terminal::Checkmate(mover.opposite())
            } else {
                Terminal::Stalemate
            };
        }
        if state.halfmove_clock() >= FIFTY_MOVE_LIMIT {
            return Terminal::DrawFiftyMove;
        }
        if Self::is_insufficient_material(state) {
            return Terminal::DrawInsufficientMaterial;
        }
        if history.is_some_and(|h| h.repetitions(state.hash()) >= REPETITION_LIMIT) {
            return Terminal::DrawRepetition;
        }
        Terminal::Ongoing
    }

    /// True when no sequence of legal moves can end in mate: bare kings, a
    /// single minor piece, or only bishops that all stand on one square color.
    pub fn is_insufficient_material(state: &GameState) -> bool {
        let mut knights = 0;
        let mut light_bishops = 0;
        let mut dark_bishops = 0;
        for (field, piece) in state.pieces() {
            match piece.kind {
                PieceType::King => {}
                PieceType::Knight => knights += 1,
                PieceType::Bishop if field.is_light() => light_bishops += 1,
                PieceType::Bishop => dark_bishops += 1,
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
            }
        }

        let minors = knights + light_bishops + dark_bishops;
        minors <= 1 || (knights == 0 && (light_bishops == 0 || dark_bishops == 0))
    }

    pub fn validate(state: &GameState) -> Result<(), RulesError> {
        state.validate().inspect_err(|e| warn!("{}", e))
    }
}
