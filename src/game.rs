use std::collections::BTreeMap;

use crate::chess_board::{GameState, Move, MoveRequest};
use crate::error::RulesError;
use crate::rules_engine::{PositionHistory, RulesEngine, Terminal};

/// One game in progress: the current position, the positions before it and
/// how often each reversible position has been seen.
#[derive(Debug, Clone)]
pub struct Game {
    state: GameState,
    undo_stack: Vec<(GameState, Move)>,
    repetition_map: BTreeMap<u64, u8>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_state(GameState::new())
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        Ok(Self::with_state(GameState::from_fen(fen)?))
    }

    pub fn with_state(state: GameState) -> Self {
        let mut game = Game {
            state,
            undo_stack: Vec::new(),
            repetition_map: BTreeMap::new(),
        };
        game.insert_hash(game.state.hash());
        game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Moves played so far, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Move> + '_ {
        self.undo_stack.iter().map(|(_, mv)| mv)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        RulesEngine::generate_legal_moves(&self.state)
    }

    pub fn status(&self) -> Terminal {
        RulesEngine::classify_terminal(&self.state, Some(self))
    }

    pub fn play(&mut self, request: MoveRequest) -> Result<Move, RulesError> {
        let status = self.status();
        if status.is_over() {
            return Err(RulesError::GameOver(status));
        }

        let mv = RulesEngine::resolve_move(&self.state, request)?;
        let next = RulesEngine::apply_move(&self.state, &mv)?;
        let previous = std::mem::replace(&mut self.state, next);
        self.undo_stack.push((previous, mv));

        // Nothing before a capture or pawn move can occur again.
        if self.state.halfmove_clock() == 0 {
            self.repetition_map.clear();
        }
        self.insert_hash(self.state.hash());
        Ok(mv)
    }

    pub fn play_algebraic(&mut self, text: &str) -> Result<Move, RulesError> {
        self.play(text.parse()?)
    }

    /// Takes back the last move, returning it.
    pub fn undo(&mut self) -> Option<Move> {
        let (previous, mv) = self.undo_stack.pop()?;
        self.state = previous;
        self.rebuild_repetition_map();
        Some(mv)
    }

    fn rebuild_repetition_map(&mut self) {
        self.repetition_map.clear();
        let positions = self
            .undo_stack
            .iter()
            .map(|(state, _)| state)
            .chain(std::iter::once(&self.state));
        let mut counts = BTreeMap::new();
        for state in positions {
            if state.halfmove_clock() == 0 {
                counts.clear();
            }
            *counts.entry(state.hash()).or_insert(0u8) += 1;
        }
        self.repetition_map = counts;
    }

    fn insert_hash(&mut self, hash: u64) {
        *self.repetition_map.entry(hash).or_insert(0) += 1;
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionHistory for Game {
    fn repetitions(&self, hash: u64) -> u8 {
        self.repetition_map.get(&hash).copied().unwrap_or(0)
    }
}
