use super::game_state::castling_index;
use super::zobrist_hash::ZOBRIST;
use super::{ChessField, Color, GameState, Piece, PieceType, Square};
use crate::error::RulesError;

pub const INITIAL_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn invalid(message: impl Into<String>) -> RulesError {
    RulesError::Fen(message.into())
}

/// Parses a FEN string into a position. The result is not validated; see
/// `GameState::from_fen` for the checked entry point.
pub fn from_fen(fen: &str) -> Result<GameState, RulesError> {
    let mut state = GameState::empty();
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(invalid(format!("expected 6 fields, found {}", parts.len())));
    }

    let rows: Vec<&str> = parts[0].split('/').collect();
    if rows.len() != 8 {
        return Err(invalid(format!("expected 8 rows, found {}", rows.len())));
    }

    for (row_index, row) in rows.iter().enumerate() {
        let board_row = 7 - row_index as u8;
        let mut col_index: u8 = 0;

        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(invalid(format!("invalid empty square count '{}'", c)));
                }
                col_index += skip as u8;
            } else {
                let piece = Piece::from_char(c)
                    .ok_or_else(|| invalid(format!("invalid piece character '{}'", c)))?;
                if col_index > 7 {
                    return Err(invalid(format!("too many squares in row {}", row_index + 1)));
                }
                state.put(ChessField::new(board_row, col_index), piece);
                col_index += 1;
            }
            if col_index > 8 {
                return Err(invalid(format!("too many squares in row {}", row_index + 1)));
            }
        }
        if col_index != 8 {
            return Err(invalid(format!("too few squares in row {}", row_index + 1)));
        }
    }

    state.active_color = match parts[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(invalid(format!("invalid active color '{}'", other))),
    };

    if parts[2] != "-" {
        for c in parts[2].chars() {
            let index = match c {
                'K' => castling_index(Color::White, true),
                'Q' => castling_index(Color::White, false),
                'k' => castling_index(Color::Black, true),
                'q' => castling_index(Color::Black, false),
                _ => return Err(invalid(format!("invalid castling character '{}'", c))),
            };
            state.castling_rights[index] = true;
        }
    }

    state.en_passant = if parts[3] == "-" {
        None
    } else {
        Some(
            ChessField::from_algebraic(parts[3])
                .map_err(|_| invalid(format!("invalid en passant square '{}'", parts[3])))?,
        )
    };

    state.halfmove_clock = parts[4]
        .parse::<u32>()
        .map_err(|_| invalid(format!("halfmove clock is not a valid number: {}", parts[4])))?;

    state.fullmove_number = parts[5]
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid(format!("fullmove number is not a valid number: {}", parts[5])))?;

    infer_has_moved(&mut state);
    state.hash = ZOBRIST.calculate_hash(&state);
    Ok(state)
}

/// FEN carries no move history, so derive `has_moved` from where the pieces
/// stand: anything away from its starting square has moved, as has a king or
/// rook whose castling right is gone.
fn infer_has_moved(state: &mut GameState) {
    for index in 0..64 {
        let field = ChessField::from_index(index);
        let Square::Occupied(piece) = state.squares[index] else {
            continue;
        };
        let on_home_rank = field.row == piece.color.home_row();
        let unmoved = match piece.kind {
            PieceType::Pawn => field.row == piece.color.pawn_start_row(),
            PieceType::Knight => on_home_rank && (field.col == 1 || field.col == 6),
            PieceType::Bishop => on_home_rank && (field.col == 2 || field.col == 5),
            PieceType::Queen => on_home_rank && field.col == 3,
            PieceType::King => {
                on_home_rank
                    && field.col == 4
                    && (state.can_castle(piece.color, true) || state.can_castle(piece.color, false))
            }
            PieceType::Rook => {
                on_home_rank
                    && ((field.col == 7 && state.can_castle(piece.color, true))
                        || (field.col == 0 && state.can_castle(piece.color, false)))
            }
        };
        state.squares[index] = Square::Occupied(Piece {
            has_moved: !unmoved,
            ..piece
        });
    }
}

pub fn to_fen(state: &GameState) -> String {
    let mut board_representation = String::new();

    for row in (0..8).rev() {
        let mut empty_count = 0;

        for col in 0..8 {
            match state.square(ChessField::new(row, col)) {
                Square::Occupied(piece) => {
                    if empty_count > 0 {
                        board_representation.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    board_representation.push(piece.to_char());
                }
                Square::Empty => {
                    empty_count += 1;
                }
            }
        }

        if empty_count > 0 {
            board_representation.push_str(&empty_count.to_string());
        }

        if row > 0 {
            board_representation.push('/');
        }
    }

    let active_color = if state.active_color == Color::White { "w" } else { "b" };

    let mut castling: String = "KQkq"
        .chars()
        .zip(state.castling_rights.iter())
        .filter(|(_, right)| **right)
        .map(|(c, _)| c)
        .collect();
    if castling.is_empty() {
        castling = "-".to_string();
    }

    let en_passant_square = match state.en_passant {
        Some(square) => square.as_algebraic(),
        None => "-".to_string(),
    };

    format!(
        "{} {} {} {} {} {}",
        board_representation,
        active_color,
        castling,
        en_passant_square,
        state.halfmove_clock,
        state.fullmove_number
    )
}
