use super::zobrist_hash::ZOBRIST;
use super::{fen, ChessField, Color, Move, Piece, PieceType, Square};
use crate::error::RulesError;

pub const WHITE_KINGSIDE: usize = 0;
pub const WHITE_QUEENSIDE: usize = 1;
pub const BLACK_KINGSIDE: usize = 2;
pub const BLACK_QUEENSIDE: usize = 3;

const KING_COL: u8 = 4;
const KINGSIDE_ROOK_COL: u8 = 7;
const QUEENSIDE_ROOK_COL: u8 = 0;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// A complete chess position.
///
/// Fields are only reachable inside the crate: every `GameState` a caller can
/// hold was either built from the initial position, parsed and validated from
/// FEN, or produced by applying a legal move to one of those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub(crate) squares: [Square; 64],
    pub(crate) active_color: Color,
    pub(crate) castling_rights: [bool; 4],
    pub(crate) en_passant: Option<ChessField>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
}

/// Index into the castling rights array for `color` on the given wing.
pub fn castling_index(color: Color, kingside: bool) -> usize {
    match (color, kingside) {
        (Color::White, true) => WHITE_KINGSIDE,
        (Color::White, false) => WHITE_QUEENSIDE,
        (Color::Black, true) => BLACK_KINGSIDE,
        (Color::Black, false) => BLACK_QUEENSIDE,
    }
}

impl GameState {
    /// The standard initial position, white to move.
    pub fn new() -> Self {
        let mut state = Self::empty();
        for (col, kind) in BACK_RANK.iter().enumerate() {
            let col = col as u8;
            state.put(ChessField::new(0, col), Piece::new(Color::White, *kind));
            state.put(ChessField::new(1, col), Piece::new(Color::White, PieceType::Pawn));
            state.put(ChessField::new(6, col), Piece::new(Color::Black, PieceType::Pawn));
            state.put(ChessField::new(7, col), Piece::new(Color::Black, *kind));
        }
        state.castling_rights = [true; 4];
        state.hash = ZOBRIST.calculate_hash(&state);
        state
    }

    /// A board without pieces. Only used while assembling a position.
    pub(crate) fn empty() -> Self {
        Self {
            squares: [Square::Empty; 64],
            active_color: Color::White,
            castling_rights: [false; 4],
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    /// Parses and validates a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let state = fen::from_fen(fen)?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_fen(&self) -> String {
        fen::to_fen(self)
    }

    pub(crate) fn put(&mut self, field: ChessField, piece: Piece) {
        self.squares[field.index()] = Square::Occupied(piece);
    }

    /// Off-board fields read as empty.
    pub fn square(&self, field: ChessField) -> Square {
        if field.is_on_board() {
            self.squares[field.index()]
        } else {
            Square::Empty
        }
    }

    pub fn piece_at(&self, field: ChessField) -> Option<Piece> {
        self.square(field).piece()
    }

    pub fn active_color(&self) -> Color {
        self.active_color
    }

    /// White kingside, white queenside, black kingside, black queenside.
    pub fn castling_rights(&self) -> [bool; 4] {
        self.castling_rights
    }

    pub fn can_castle(&self, color: Color, kingside: bool) -> bool {
        self.castling_rights[castling_index(color, kingside)]
    }

    pub fn en_passant(&self) -> Option<ChessField> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Zobrist key of the position.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns an iterator over all pieces on the board along with their fields.
    pub fn pieces(&self) -> impl Iterator<Item = (ChessField, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, square)| square.piece().map(|piece| (ChessField::from_index(index), piece)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (ChessField, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    pub fn find_king_position(&self, color: Color) -> Option<ChessField> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.kind == PieceType::King)
            .map(|(field, _)| field)
    }

    /// Checks whether any piece of `attacker` attacks `field`, regardless of whose turn it is.
    pub fn is_square_attacked_by_color(&self, field: ChessField, attacker: Color) -> bool {
        if !field.is_on_board() {
            return false;
        }
        const DIRECTIONS: [(i8, i8); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];
        for &(d_row, d_col) in &DIRECTIONS {
            let is_diagonal = d_row != 0 && d_col != 0;
            let mut current = field;

            while let Some(next) = current.offset(d_row, d_col) {
                current = next;
                match self.square(next) {
                    Square::Empty => continue,
                    Square::Occupied(piece) => {
                        if piece.color == attacker {
                            match piece.kind {
                                PieceType::Rook if !is_diagonal => return true,
                                PieceType::Bishop if is_diagonal => return true,
                                PieceType::Queen => return true,
                                _ => {}
                            }
                        }
                        break;
                    }
                }
            }
        }

        // A pawn attacks diagonally forward, so look one rank behind the field from its point of view.
        let behind = -attacker.pawn_direction();
        if self.has_piece_at_offsets(field, &[(behind, -1), (behind, 1)], attacker, PieceType::Pawn) {
            return true;
        }

        const KNIGHT_OFFSETS: [(i8, i8); 8] = [(-2, -1), (-1, -2), (1, -2), (2, -1), (2, 1), (1, 2), (-1, 2), (-2, 1)];
        if self.has_piece_at_offsets(field, &KNIGHT_OFFSETS, attacker, PieceType::Knight) {
            return true;
        }

        self.has_piece_at_offsets(field, &DIRECTIONS, attacker, PieceType::King)
    }

    fn has_piece_at_offsets(&self, field: ChessField, offsets: &[(i8, i8)], color: Color, kind: PieceType) -> bool {
        offsets.iter().any(|&(d_row, d_col)| {
            field
                .offset(d_row, d_col)
                .and_then(|target| self.piece_at(target))
                .is_some_and(|piece| piece.color == color && piece.kind == kind)
        })
    }

    pub fn is_king_attacked(&self, color: Color) -> bool {
        self.find_king_position(color)
            .is_some_and(|king| self.is_square_attacked_by_color(king, color.opposite()))
    }

    /// Plays `mv` without checking legality. Callers outside the move generator go
    /// through `RulesEngine::apply_move`, which checks first.
    pub(crate) fn make_move(&mut self, mv: &Move) {
        let zobrist = &*ZOBRIST;
        let mut hash = self.hash;
        hash = zobrist.update_castling(hash, self.castling_rights);
        hash ^= zobrist.en_passant_key(self);

        let piece = mv.moved_piece;
        if piece.kind == PieceType::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if mv.is_en_passant {
            let victim = ChessField::new(mv.from.row, mv.to.col);
            hash = zobrist.update_square(hash, self.square(victim), victim);
            self.squares[victim.index()] = Square::Empty;
        } else {
            hash = zobrist.update_square(hash, self.square(mv.to), mv.to);
        }

        hash = zobrist.update_square(hash, self.square(mv.from), mv.from);
        self.squares[mv.from.index()] = Square::Empty;

        let placed = Piece {
            kind: mv.promotion.unwrap_or(piece.kind),
            ..piece.moved()
        };
        self.put(mv.to, placed);
        hash = zobrist.update_piece(hash, placed, mv.to);

        if mv.is_castle {
            let (rook_col, rook_target_col) = if mv.to.col > mv.from.col {
                (KINGSIDE_ROOK_COL, 5)
            } else {
                (QUEENSIDE_ROOK_COL, 3)
            };
            let rook_from = ChessField::new(mv.from.row, rook_col);
            let rook_to = ChessField::new(mv.from.row, rook_target_col);
            if let Square::Occupied(rook) = self.square(rook_from) {
                hash = zobrist.update_piece(hash, rook, rook_from);
                self.squares[rook_from.index()] = Square::Empty;
                self.put(rook_to, rook.moved());
                hash = zobrist.update_piece(hash, rook.moved(), rook_to);
            }
        }

        self.revoke_castling_rights(mv.from);
        self.revoke_castling_rights(mv.to);

        self.en_passant = None;
        if piece.kind == PieceType::Pawn && mv.from.row.abs_diff(mv.to.row) == 2 {
            self.en_passant = Some(ChessField::new((mv.from.row + mv.to.row) / 2, mv.from.col));
        }

        self.active_color = self.active_color.opposite();
        if self.active_color == Color::White {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        hash = zobrist.update_castling(hash, self.castling_rights);
        hash = zobrist.update_active_side(hash);
        hash ^= zobrist.en_passant_key(self);

        self.hash = hash;
    }

    /// Anything leaving or landing on a king or rook home square costs the matching right.
    fn revoke_castling_rights(&mut self, field: ChessField) {
        for color in [Color::White, Color::Black] {
            if field.row != color.home_row() {
                continue;
            }
            match field.col {
                KING_COL => {
                    self.castling_rights[castling_index(color, true)] = false;
                    self.castling_rights[castling_index(color, false)] = false;
                }
                KINGSIDE_ROOK_COL => self.castling_rights[castling_index(color, true)] = false,
                QUEENSIDE_ROOK_COL => self.castling_rights[castling_index(color, false)] = false,
                _ => {}
            }
        }
    }

    /// Checks the invariants every reachable position satisfies.
    pub fn validate(&self) -> Result<(), RulesError> {
        for color in [Color::White, Color::Black] {
            let kings = self
                .pieces_of(color)
                .filter(|(_, piece)| piece.kind == PieceType::King)
                .count();
            if kings != 1 {
                return Err(RulesError::InvalidState(format!(
                    "expected exactly one {} king, found {}",
                    color, kings
                )));
            }
        }

        if let Some((field, _)) = self
            .pieces()
            .find(|(field, piece)| piece.kind == PieceType::Pawn && (field.row == 0 || field.row == 7))
        {
            return Err(RulesError::InvalidState(format!("pawn on back rank at {}", field)));
        }

        if self.is_king_attacked(self.active_color.opposite()) {
            return Err(RulesError::InvalidState(format!(
                "{} is in check but it is {}'s turn",
                self.active_color.opposite(),
                self.active_color
            )));
        }

        if let Some(target) = self.en_passant {
            self.validate_en_passant(target)?;
        }

        for color in [Color::White, Color::Black] {
            for kingside in [true, false] {
                if self.can_castle(color, kingside) && !self.castling_pieces_at_home(color, kingside) {
                    return Err(RulesError::InvalidState(format!(
                        "{} {} castling right without king and rook on their home squares",
                        color,
                        if kingside { "kingside" } else { "queenside" }
                    )));
                }
            }
        }

        Ok(())
    }

    fn validate_en_passant(&self, target: ChessField) -> Result<(), RulesError> {
        let pusher = self.active_color.opposite();
        let invalid = |reason: &str| RulesError::InvalidState(format!("en passant square {}: {}", target, reason));

        // The target sits between the start and landing squares of the pawn that just moved.
        if target.row as i8 != pusher.pawn_start_row() as i8 + pusher.pawn_direction() {
            return Err(invalid("wrong rank for the side to move"));
        }
        if !self.square(target).is_empty() {
            return Err(invalid("square is occupied"));
        }
        let origin = ChessField::new(pusher.pawn_start_row(), target.col);
        if !self.square(origin).is_empty() {
            return Err(invalid("pawn start square is occupied"));
        }
        let landing = ChessField::new((target.row as i8 + pusher.pawn_direction()) as u8, target.col);
        match self.piece_at(landing) {
            Some(piece) if piece.color == pusher && piece.kind == PieceType::Pawn => Ok(()),
            _ => Err(invalid("no pawn that just advanced two squares")),
        }
    }

    fn castling_pieces_at_home(&self, color: Color, kingside: bool) -> bool {
        let row = color.home_row();
        let rook_col = if kingside { KINGSIDE_ROOK_COL } else { QUEENSIDE_ROOK_COL };
        let is = |col: u8, kind: PieceType| {
            self.piece_at(ChessField::new(row, col))
                .is_some_and(|piece| piece.color == color && piece.kind == kind)
        };
        is(KING_COL, PieceType::King) && is(rook_col, PieceType::Rook)
    }

    pub fn render_to_string(&self) -> String {
        let mut board_representation = String::new();
        board_representation.push_str("    a   b   c   d   e   f   g   h  \n");
        board_representation.push_str("  ┌───┬───┬───┬───┬───┬───┬───┬───┐\n");

        for row in (0..8).rev() {
            board_representation.push_str(&format!("{} │", row + 1));
            for col in 0..8 {
                let square = match self.square(ChessField::new(row, col)) {
                    Square::Empty => ' ',
                    Square::Occupied(piece) => piece.to_char(),
                };
                board_representation.push_str(&format!(" {} │", square));
            }
            board_representation.push_str(&format!(" {}\n", row + 1));

            if row > 0 {
                board_representation.push_str("  ├───┼───┼───┼───┼───┼───┼───┼───┤\n");
            }
        }

        board_representation.push_str("  └───┴───┴───┴───┴───┴───┴───┴───┘\n");
        board_representation.push_str("    a   b   c   d   e   f   g   h  \n");

        board_representation
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess_board::fen::INITIAL_POSITION;
    use crate::chess_board::test_utils::{board, field, play, unchecked_board};
    use test_case::test_case;

    fn piece(fen_char: char) -> Piece {
        Piece::from_char(fen_char).unwrap()
    }

    #[test]
    fn new_is_the_initial_position() {
        let state = GameState::new();
        assert_eq!(state.to_fen(), INITIAL_POSITION);
        assert_eq!(state, board(INITIAL_POSITION));
    }

    #[test]
    fn square_attacks() {
        let state = unchecked_board("8/2P5/8/8/8/8/3p4/8 w - - 0 1");
        assert!(state.is_square_attacked_by_color(field("c1"), Color::Black));
        assert!(!state.is_square_attacked_by_color(field("d1"), Color::Black));
        assert!(state.is_square_attacked_by_color(field("e1"), Color::Black));

        assert!(state.is_square_attacked_by_color(field("b8"), Color::White));
        assert!(!state.is_square_attacked_by_color(field("c8"), Color::White));
        assert!(state.is_square_attacked_by_color(field("d8"), Color::White));
        assert!(!state.is_square_attacked_by_color(field("b8"), Color::Black));
    }

    #[test]
    fn sliding_attacks_stop_at_blockers() {
        let state = unchecked_board("8/8/8/8/1r1P4/8/8/8 w - - 0 1");
        assert!(state.is_square_attacked_by_color(field("d4"), Color::Black));
        assert!(!state.is_square_attacked_by_color(field("e4"), Color::Black));
        assert!(state.is_square_attacked_by_color(field("b8"), Color::Black));
        assert!(!state.is_square_attacked_by_color(field("c5"), Color::Black));
    }

    #[test]
    fn knight_and_king_attacks() {
        let state = unchecked_board("8/8/8/8/3n4/8/8/6K1 w - - 0 1");
        assert!(state.is_square_attacked_by_color(field("e2"), Color::Black));
        assert!(!state.is_square_attacked_by_color(field("d3"), Color::Black));
        assert!(state.is_square_attacked_by_color(field("h2"), Color::White));
        assert!(!state.is_square_attacked_by_color(field("e1"), Color::White));
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let state = play("8/2P5/1p6/8/8/p7/PP6/k3K3 w - - 0 1", &["c7c8q"]);
        assert_eq!(state.piece_at(field("c8")), Some(piece('Q').moved()));
        assert_eq!(state.piece_at(field("c7")), None);
        assert_eq!(state.halfmove_clock(), 0);
    }

    #[test]
    fn capturing_a_rook_revokes_castling() {
        let state = play("rnbq1k1r/pp1Pbppp/2p5/8/2B5/P7/1PP1NnPP/RNBQK2R b KQ - 0 8", &["f2h1"]);
        assert!(!state.can_castle(Color::White, true));
        assert!(state.can_castle(Color::White, false));
    }

    #[test_case("e1g1", "g1", "f1", [false, false, true, true]; "white kingside")]
    #[test_case("e1c1", "c1", "d1", [false, false, true, true]; "white queenside")]
    fn castling_moves_king_and_rook(mv: &str, king: &str, rook: &str, rights: [bool; 4]) {
        let state = play("rnbqk2r/ppp2pbp/3p1np1/4p3/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", &[mv]);
        assert_eq!(state.piece_at(field(king)).map(|p| p.kind), Some(PieceType::King));
        assert_eq!(state.piece_at(field(rook)).map(|p| p.kind), Some(PieceType::Rook));
        assert!(state.piece_at(field(rook)).is_some_and(|p| p.has_moved));
        assert_eq!(state.castling_rights(), rights);
        assert_eq!(state.en_passant(), None);
    }

    #[test_case("e8g8", "g8", "f8"; "black kingside")]
    #[test_case("e8c8", "c8", "d8"; "black queenside")]
    fn black_castling(mv: &str, king: &str, rook: &str) {
        let state = play("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1", &[mv]);
        assert_eq!(state.piece_at(field(king)).map(|p| p.kind), Some(PieceType::King));
        assert_eq!(state.piece_at(field(rook)).map(|p| p.kind), Some(PieceType::Rook));
        assert_eq!(state.castling_rights(), [true, true, false, false]);
    }

    #[test_case("a1b1", [true, false, true, true]; "white a rook")]
    #[test_case("h1g1", [false, true, true, true]; "white h rook")]
    #[test_case("e1d1", [false, false, true, true]; "white king")]
    fn moving_king_or_rook_revokes_rights(mv: &str, rights: [bool; 4]) {
        let state = play("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", &[mv]);
        assert_eq!(state.castling_rights(), rights);
    }

    #[test]
    fn double_push_sets_en_passant_and_clocks() {
        let state = play(INITIAL_POSITION, &["e2e4"]);
        assert_eq!(state.en_passant(), Some(field("e3")));
        assert_eq!(state.active_color(), Color::Black);
        assert_eq!(state.fullmove_number(), 1);

        let state = play(INITIAL_POSITION, &["e2e4", "g8f6", "g1f3"]);
        assert_eq!(state.en_passant(), None);
        assert_eq!(state.halfmove_clock(), 2);
        assert_eq!(state.fullmove_number(), 2);
        assert!(state.piece_at(field("f3")).is_some_and(|p| p.has_moved));
    }

    #[test]
    fn clocks_saturate_instead_of_overflowing() {
        let state = play("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295", &["e8d7"]);
        assert_eq!(state.fullmove_number(), u32::MAX);

        let state = play("4k3/8/8/8/8/8/8/R3K3 w - - 4294967295 1", &["e1d1"]);
        assert_eq!(state.halfmove_clock(), u32::MAX);
    }

    #[test]
    fn off_board_fields_read_as_empty() {
        let state = GameState::new();
        let outside = ChessField { row: 8, col: 0 };
        assert_eq!(state.square(outside), Square::Empty);
        assert_eq!(state.piece_at(ChessField { row: 0, col: 9 }), None);
        assert!(!state.is_square_attacked_by_color(outside, Color::Black));
    }

    #[test_case("4k3/8/8/8/8/8/8/3KK3 w - - 0 1"; "two white kings")]
    #[test_case("8/8/8/8/8/8/8/4K3 w - - 0 1"; "missing black king")]
    #[test_case("P3k3/8/8/8/8/8/8/4K3 w - - 0 1"; "pawn on last rank")]
    #[test_case("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1"; "side not to move in check")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w K - 0 1"; "castling right without rook")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w - e6 0 1"; "en passant without pawn")]
    #[test_case("4k3/8/8/4p3/8/8/8/4K3 w - e3 0 1"; "en passant on wrong rank")]
    fn invalid_states_are_rejected(fen: &str) {
        assert!(matches!(GameState::from_fen(fen), Err(RulesError::InvalidState(_))));
    }

    #[test]
    fn render_shows_pieces() {
        let rendered = GameState::new().render_to_string();
        assert!(rendered.starts_with("    a   b"));
        assert!(rendered.contains("8 │ r │ n │ b │ q │ k │ b │ n │ r │ 8"));
        assert!(rendered.contains("1 │ R │ N │ B │ Q │ K │ B │ N │ R │ 1"));
    }
}
