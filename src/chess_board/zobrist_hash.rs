use super::{ChessField, Color, GameState, Piece, PieceType, Square};
use lazy_static::lazy_static;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const BOARD_SIZE: usize = 8;

/// Random keys for incremental position hashing.
///
/// The en passant file only enters the hash when the side to move has a pawn
/// that could capture, so two positions that differ only in an unusable en
/// passant square hash identically. Repetition detection depends on that.
pub struct ZobristHash {
    piece_keys: [[[u64; BOARD_SIZE * BOARD_SIZE]; 6]; 2],
    side_to_move_key: u64,
    castling_keys: [u64; 4],
    en_passant_keys: [u64; BOARD_SIZE],
}

impl ZobristHash {
    fn new(seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);

        let mut piece_keys = [[[0; BOARD_SIZE * BOARD_SIZE]; 6]; 2];
        for color_keys in &mut piece_keys {
            for piece_type_keys in color_keys {
                for square_key in piece_type_keys {
                    *square_key = rng.gen();
                }
            }
        }

        let side_to_move_key = rng.gen();

        let mut castling_keys = [0; 4];
        for key in &mut castling_keys {
            *key = rng.gen();
        }

        let mut en_passant_keys = [0; BOARD_SIZE];
        for file in &mut en_passant_keys {
            *file = rng.gen();
        }

        ZobristHash {
            piece_keys,
            side_to_move_key,
            castling_keys,
            en_passant_keys,
        }
    }

    pub fn calculate_hash(&self, state: &GameState) -> u64 {
        let mut hash = 0;

        for (field, piece) in state.pieces() {
            hash = self.update_piece(hash, piece, field);
        }

        if state.active_color() == Color::Black {
            hash = self.update_active_side(hash);
        }

        hash = self.update_castling(hash, state.castling_rights());
        hash ^ self.en_passant_key(state)
    }

    /// Toggles `piece` on `field`. Calling it twice removes the piece again.
    pub fn update_piece(&self, hash: u64, piece: Piece, field: ChessField) -> u64 {
        hash ^ self.piece_keys[piece.color.index()][piece.kind.index()][field.index()]
    }

    pub fn update_square(&self, hash: u64, square: Square, field: ChessField) -> u64 {
        match square {
            Square::Occupied(piece) => self.update_piece(hash, piece, field),
            Square::Empty => hash,
        }
    }

    pub fn update_castling(&self, hash: u64, castling_rights: [bool; 4]) -> u64 {
        castling_rights
            .iter()
            .zip(self.castling_keys.iter())
            .filter(|(right, _)| **right)
            .fold(hash, |hash, (_, key)| hash ^ key)
    }

    pub fn update_active_side(&self, hash: u64) -> u64 {
        hash ^ self.side_to_move_key
    }

    /// Key of the en passant file, or 0 when no pawn of the side to move can use it.
    pub fn en_passant_key(&self, state: &GameState) -> u64 {
        let Some(target) = state.en_passant() else {
            return 0;
        };
        let mover = state.active_color();
        let capture_possible = [-1, 1].iter().any(|&d_col| {
            target
                .offset(-mover.pawn_direction(), d_col)
                .and_then(|field| state.piece_at(field))
                .is_some_and(|p| p.color == mover && p.kind == PieceType::Pawn)
        });
        if capture_possible {
            self.en_passant_keys[target.col as usize]
        } else {
            0
        }
    }
}

lazy_static! {
    pub static ref ZOBRIST: ZobristHash = ZobristHash::new(42);
}
