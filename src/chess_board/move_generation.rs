use super::{ChessField, Color, GameState, Move, Piece, PieceType, Square};

const KNIGHT_MOVES: [(i8, i8); 8] = [(-2, -1), (-1, -2), (1, -2), (2, -1), (2, 1), (1, 2), (-1, 2), (-2, 1)];
const KING_MOVES: [(i8, i8); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [(-1, -1), (-1, 1), (1, -1), (1, 1), (0, -1), (0, 1), (-1, 0), (1, 0)];

/// Pseudo-legal moves of one piece: right shape, but possibly leaving its own king in check.
///
/// Empty unless `from` holds a `color` piece of `kind`.
pub fn pseudo_legal_targets(kind: PieceType, color: Color, from: ChessField, state: &GameState) -> Vec<Move> {
    let moving = match state.piece_at(from) {
        Some(piece) if piece.kind == kind && piece.color == color => piece,
        _ => return Vec::new(),
    };
    match kind {
        PieceType::Pawn => generate_pawn_moves(state, moving, from),
        PieceType::Knight => generate_moves_from_directions(state, moving, from, &KNIGHT_MOVES),
        PieceType::Bishop => generate_sliding_moves(state, moving, from, &BISHOP_DIRECTIONS),
        PieceType::Rook => generate_sliding_moves(state, moving, from, &ROOK_DIRECTIONS),
        PieceType::Queen => generate_sliding_moves(state, moving, from, &QUEEN_DIRECTIONS),
        PieceType::King => generate_king_moves(state, moving, from),
    }
}

fn plain_move(state: &GameState, moving: Piece, from: ChessField, to: ChessField) -> Move {
    Move {
        from,
        to,
        moved_piece: moving,
        captured_piece: state.piece_at(to),
        promotion: None,
        is_castle: false,
        is_en_passant: false,
    }
}

fn generate_pawn_moves(state: &GameState, pawn: Piece, from: ChessField) -> Vec<Move> {
    let mut moves = Vec::new();
    let color = pawn.color;
    let forward = color.pawn_direction();

    // Regular forward move
    if let Some(one_forward) = from.offset(forward, 0) {
        if state.square(one_forward).is_empty() {
            add_pawn_moves_with_and_without_promotion(plain_move(state, pawn, from, one_forward), color, &mut moves);

            // Double move from start position
            if from.row == color.pawn_start_row() {
                if let Some(two_forward) = from.offset(2 * forward, 0) {
                    if state.square(two_forward).is_empty() {
                        moves.push(plain_move(state, pawn, from, two_forward));
                    }
                }
            }
        }
    }

    for d_col in [-1, 1] {
        let Some(target) = from.offset(forward, d_col) else {
            continue;
        };
        match state.square(target) {
            Square::Occupied(victim) if victim.color != color => {
                add_pawn_moves_with_and_without_promotion(plain_move(state, pawn, from, target), color, &mut moves);
            }
            Square::Empty if color == state.active_color() && state.en_passant() == Some(target) => {
                let victim_field = ChessField::new(from.row, target.col);
                if let Some(victim) = state.piece_at(victim_field) {
                    if victim.color != color && victim.kind == PieceType::Pawn {
                        moves.push(Move {
                            captured_piece: Some(victim),
                            is_en_passant: true,
                            ..plain_move(state, pawn, from, target)
                        });
                    }
                }
            }
            _ => {}
        }
    }

    moves
}

fn add_pawn_moves_with_and_without_promotion(mv: Move, color: Color, moves: &mut Vec<Move>) {
    if mv.to.row == color.promotion_row() {
        for promotion_piece in PieceType::PROMOTIONS {
            moves.push(Move {
                promotion: Some(promotion_piece),
                ..mv
            });
        }
    } else {
        moves.push(mv);
    }
}

/// Generate sliding piece moves (bishop, rook, queen).
fn generate_sliding_moves(state: &GameState, moving: Piece, from: ChessField, directions: &[(i8, i8)]) -> Vec<Move> {
    let mut moves = Vec::new();

    for &(d_row, d_col) in directions {
        let mut current = from;
        while let Some(next) = current.offset(d_row, d_col) {
            current = next;
            match state.square(next) {
                Square::Empty => moves.push(plain_move(state, moving, from, next)),
                Square::Occupied(p) => {
                    if p.color != moving.color {
                        moves.push(plain_move(state, moving, from, next));
                    }
                    break;
                }
            }
        }
    }

    moves
}

fn generate_moves_from_directions(
    state: &GameState,
    moving: Piece,
    from: ChessField,
    directions: &[(i8, i8)],
) -> Vec<Move> {
    directions
        .iter()
        .filter_map(|&(d_row, d_col)| from.offset(d_row, d_col))
        .filter(|&to| state.piece_at(to).map_or(true, |p| p.color != moving.color))
        .map(|to| plain_move(state, moving, from, to))
        .collect()
}

/// Generate king moves (including castling).
fn generate_king_moves(state: &GameState, king: Piece, from: ChessField) -> Vec<Move> {
    let mut moves = generate_moves_from_directions(state, king, from, &KING_MOVES);

    let color = king.color;
    let row = color.home_row();
    if from != ChessField::new(row, 4) {
        return moves;
    }

    let opponent = color.opposite();
    let empty = |col: u8| state.square(ChessField::new(row, col)).is_empty();
    let safe = |col: u8| !state.is_square_attacked_by_color(ChessField::new(row, col), opponent);
    let own_rook_at = |col: u8| {
        state
            .piece_at(ChessField::new(row, col))
            .is_some_and(|p| p.color == color && p.kind == PieceType::Rook)
    };

    if state.can_castle(color, true) && own_rook_at(7) && empty(5) && empty(6) && safe(4) && safe(5) && safe(6) {
        moves.push(Move {
            is_castle: true,
            ..plain_move(state, king, from, ChessField::new(row, 6))
        });
    }

    if state.can_castle(color, false)
        && own_rook_at(0)
        && empty(3)
        && empty(2)
        && empty(1)
        && safe(4)
        && safe(3)
        && safe(2)
    {
        moves.push(Move {
            is_castle: true,
            ..plain_move(state, king, from, ChessField::new(row, 2))
        });
    }
    moves
}

impl GameState {
    pub fn generate_pseudo_moves(&self) -> Vec<Move> {
        let mut all_moves = Vec::with_capacity(64);
        for (field, piece) in self.pieces_of(self.active_color) {
            all_moves.extend(pseudo_legal_targets(piece.kind, piece.color, field, self));
        }
        all_moves
    }

    /// All moves of the side to move that do not leave its own king attacked.
    pub fn generate_legal_moves(&self) -> Vec<Move> {
        let mover = self.active_color;
        self.generate_pseudo_moves()
            .into_iter()
            .filter(|mv| {
                let mut board_clone = self.clone();
                board_clone.make_move(mv);
                !board_clone.is_king_attacked(mover)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess_board::test_utils::{assert_moves, board, field, play, unchecked_board};
    use test_case::test_case;

    fn targets_from(fen: &str, square: &str) -> Vec<Move> {
        let state = unchecked_board(fen);
        let from = field(square);
        let piece = state.piece_at(from).expect("no piece on the requested square");
        pseudo_legal_targets(piece.kind, piece.color, from, &state)
    }

    #[test_case("8/8/8/8/4P3/8/8/8 w - - 0 1", "e4", &["e4e5"]; "single push")]
    #[test_case("8/8/8/8/P7/P7/8/8 w - - 0 1", "a3", &[]; "blocked pawn")]
    #[test_case("8/8/3p4/4Pp2/8/8/8/8 w - f6 0 1", "e5", &["e5d6", "e5e6", "e5f6"]; "en passant and capture")]
    #[test_case("8/8/8/8/8/p1p5/1P6/8 w - - 0 1", "b2", &["b2b3", "b2b4", "b2a3", "b2c3"]; "double push and captures")]
    #[test_case("8/p7/8/p7/8/8/8/8 b - - 0 1", "a7", &["a7a6"]; "black double push blocked")]
    #[test_case("8/p7/1p6/8/8/8/8/8 b - - 0 1", "a7", &["a7a6", "a7a5"]; "no capture of own piece")]
    #[test_case("8/1p6/P1P5/8/8/8/8/8 b - - 0 1", "b7", &["b7b6", "b7b5", "b7a6", "b7c6"]; "black captures")]
    #[test_case("8/6P1/8/8/8/8/8/8 w - - 0 1", "g7", &["g7g8q", "g7g8r", "g7g8b", "g7g8n"]; "white promotion")]
    #[test_case(
        "3r4/2P5/8/8/8/8/8/8 w - - 0 1", "c7",
        &["c7c8b", "c7c8n", "c7c8r", "c7c8q", "c7d8b", "c7d8n", "c7d8r", "c7d8q"];
        "promotion with capture"
    )]
    #[test_case(
        "4k1nr/2p3p1/b2pPp1p/8/1nN1P1P1/5N2/Pp3P2/2R2K2 b k - 1 27", "b2",
        &["b2b1b", "b2b1n", "b2b1q", "b2b1r", "b2c1b", "b2c1n", "b2c1r", "b2c1q"];
        "black promotion"
    )]
    fn pawn_targets(fen: &str, square: &str, expected: &[&str]) {
        assert_moves(targets_from(fen, square), expected);
    }

    #[test_case("8/8/8/8/3N4/8/8/8 w - - 0 1", "d4", &["d4b3", "d4c2", "d4e2", "d4f3", "d4f5", "d4e6", "d4c6", "d4b5"]; "open knight")]
    #[test_case("8/8/8/1rn5/2r5/N7/2B5/1Q6 w - - 0 1", "a3", &["a3c4", "a3b5"]; "knight on the rim")]
    #[test_case("8/6r1/5B2/8/3P4/8/8/8 w - - 0 1", "f6", &["f6d8", "f6e7", "f6g5", "f6h4", "f6e5", "f6g7"]; "bishop blocked and capturing")]
    #[test_case("8/8/8/8/3bR3/8/4N3/8 w - - 0 1", "e4", &["e4e3", "e4e5", "e4e6", "e4e7", "e4e8", "e4d4", "e4f4", "e4g4", "e4h4"]; "rook blocked and capturing")]
    #[test_case("8/b7/1b6/qb6/1P6/P7/8/8 b - - 0 1", "a5", &["a5a6", "a5a4", "a5a3", "a5b4"]; "boxed in queen")]
    #[test_case("8/8/8/3ppp2/3PKP2/3PPP2/8/8 w - - 0 1", "e4", &["e4d5", "e4e5", "e4f5"]; "king surrounded")]
    #[test_case("K7/8/8/8/8/8/8/8 w - - 0 1", "a8", &["a8a7", "a8b8", "a8b7"]; "king in the corner")]
    fn piece_targets(fen: &str, square: &str, expected: &[&str]) {
        assert_moves(targets_from(fen, square), expected);
    }

    #[test]
    fn no_targets_without_the_described_piece() {
        let state = unchecked_board("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 w kq - 0 1");
        assert!(pseudo_legal_targets(PieceType::King, Color::White, field("e1"), &state).is_empty());
        assert!(pseudo_legal_targets(PieceType::Queen, Color::White, field("f1"), &state).is_empty());
        assert!(pseudo_legal_targets(PieceType::Rook, Color::Black, field("f1"), &state).is_empty());
        assert!(pseudo_legal_targets(PieceType::Rook, Color::White, ChessField::new(0, 8), &state).is_empty());
        assert!(!pseudo_legal_targets(PieceType::Rook, Color::White, field("f1"), &state).is_empty());
    }

    #[test]
    fn queen_covers_both_rook_and_bishop_lines() {
        let moves = targets_from("8/8/8/8/3Q4/8/8/8 w - - 0 1", "d4");
        assert_eq!(moves.len(), 27);
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test_case("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", "e1", &["e1d1", "e1f1", "e1c1", "e1g1"]; "both wings open")]
    #[test_case("1r2k2r/pppppppp/8/8/8/8/PPPPPPPP/1R2K2R w Kk - 0 1", "e1", &["e1d1", "e1f1", "e1g1"]; "queenside right gone")]
    #[test_case("r3k1r1/pppppppp/8/8/8/8/PPPPPPPP/R3K1R1 b Qq - 0 1", "e8", &["e8d8", "e8f8", "e8c8"]; "kingside right gone")]
    #[test_case("r2bkb1r/pppppppp/8/8/8/8/PPPPPPPP/R2BKB1R w KQkq - 0 1", "e1", &[]; "blocked next to the king")]
    #[test_case("r1b1k1br/pppppppp/8/8/8/8/PPPPPPPP/R1B1K1BR b KQkq - 0 1", "e8", &["e8d8", "e8f8"]; "blocked next to the rook")]
    #[test_case("rb2k2r/pppppppp/8/8/8/8/PPPPPPPP/RB2K2R w KQkq - 0 1", "e1", &["e1d1", "e1f1", "e1g1"]; "b file blocked")]
    #[test_case("1r2k2r/ppppp1pp/8/8/8/8/PPPPP1PP/R4RK1 b k - 0 1", "e8", &["e8d8", "e8f7", "e8f8"]; "passing an attacked square")]
    fn castling_targets(fen: &str, square: &str, expected: &[&str]) {
        assert_moves(targets_from(fen, square), expected);
    }

    #[test]
    fn castling_moves_are_flagged() {
        let moves = targets_from("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", "e1");
        let castles: Vec<_> = moves.iter().filter(|m| m.is_castle).map(|m| m.as_algebraic()).collect();
        assert_eq!(castles.len(), 2);
        assert!(castles.contains(&"e1g1".to_string()));
        assert!(castles.contains(&"e1c1".to_string()));
    }

    #[test]
    fn start_position_has_twenty_moves() {
        assert_eq!(GameState::new().generate_legal_moves().len(), 20);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let state = board("1k6/8/8/8/3q4/8/1R6/K7 w - - 0 1");
        assert_moves(state.generate_legal_moves(), &["a1a2", "a1b1"]);
    }

    #[test]
    fn en_passant_after_double_push() {
        let state = play("4k3/4p3/8/3P4/8/8/8/4K3 b - - 0 1", &["e7e5"]);
        let from_d5: Vec<_> = state.generate_legal_moves().into_iter().filter(|m| m.from == field("d5")).collect();
        assert_moves(from_d5.clone(), &["d5d6", "d5e6"]);
        let en_passant = from_d5.iter().find(|m| m.is_en_passant).expect("en passant capture");
        assert_eq!(en_passant.captured_piece.map(|p| p.kind), Some(PieceType::Pawn));
    }

    #[test]
    fn en_passant_expires_after_one_move() {
        let state = play("4k3/4p3/8/3P4/8/8/8/4K3 b - - 0 1", &["e7e5", "e1d1", "e8d8"]);
        assert!(state.generate_legal_moves().iter().all(|m| !m.is_en_passant));
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        let state = play("r3k2r/p2pqpb1/bn2pnp1/2pPN3/1pB1P3/2N2Q1p/PPPB1PPP/R3K2R w KQkq c6 0 2", &["d5c6"]);
        assert_eq!(state.square(field("c5")), Square::Empty);
        assert_eq!(state.piece_at(field("c6")).map(|p| p.kind), Some(PieceType::Pawn));
    }

    #[test]
    fn en_passant_that_exposes_the_king_is_illegal() {
        // Both pawns leave the fifth rank and open the rook's line to the king.
        let state = board("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
        assert!(state.generate_legal_moves().iter().all(|m| !m.is_en_passant));
    }
}
