use std::fmt;
use std::str::FromStr;

use crate::error::RulesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Rank holding this side's king and rooks at the start of the game.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn pawn_start_row(&self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    pub fn promotion_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// The pieces a pawn may turn into on the last rank.
    pub const PROMOTIONS: [PieceType; 4] = [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

    pub fn index(&self) -> usize {
        match self {
            PieceType::Pawn => 0,
            PieceType::Knight => 1,
            PieceType::Bishop => 2,
            PieceType::Rook => 3,
            PieceType::Queen => 4,
            PieceType::King => 5,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "P"),
            PieceType::Knight => write!(f, "N"),
            PieceType::Bishop => write!(f, "B"),
            PieceType::Rook => write!(f, "R"),
            PieceType::Queen => write!(f, "Q"),
            PieceType::King => write!(f, "K"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
    /// Set once the piece has left its square at least once.
    pub has_moved: bool,
}

impl Piece {
    pub fn new(color: Color, kind: PieceType) -> Self {
        Self {
            color,
            kind,
            has_moved: false,
        }
    }

    pub fn moved(self) -> Self {
        Self { has_moved: true, ..self }
    }

    /// FEN letter: upper case for white, lower case for black.
    pub fn to_char(&self) -> char {
        let c = match self.kind {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceType::from_char(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Self::new(color, kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Occupied(Piece),
    Empty,
}

impl Square {
    pub fn piece(&self) -> Option<Piece> {
        match self {
            Square::Occupied(piece) => Some(*piece),
            Square::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Square::Empty)
    }
}

/// Board coordinate: `row` is the rank (0 = rank 1), `col` the file (0 = file a).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub struct ChessField {
    pub row: u8,
    pub col: u8,
}

impl ChessField {
    /// Builds a field without range checks. Off-board fields never match a
    /// piece or a legal move; use `try_new` for coordinates from outside.
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn try_new(row: u8, col: u8) -> Option<Self> {
        let field = Self { row, col };
        field.is_on_board().then_some(field)
    }

    pub fn is_on_board(&self) -> bool {
        self.row < 8 && self.col < 8
    }

    pub fn from_index(index: usize) -> Self {
        Self::new((index / 8) as u8, (index % 8) as u8)
    }

    /// Index into the flat board array (`row * 8 + col`).
    pub fn index(&self) -> usize {
        self.row as usize * 8 + self.col as usize
    }

    /// The field `d_row` ranks and `d_col` files away, if it is still on the board.
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<ChessField> {
        if !self.is_on_board() {
            return None;
        }
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(ChessField::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn is_light(&self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    pub fn from_algebraic(algebraic: &str) -> Result<Self, RulesError> {
        let bytes = algebraic.as_bytes();
        if bytes.len() != 2 {
            return Err(RulesError::InvalidMoveText(algebraic.to_string()));
        }
        let col = bytes[0].wrapping_sub(b'a');
        let row = bytes[1].wrapping_sub(b'1');
        if col < 8 && row < 8 {
            Ok(Self::new(row, col))
        } else {
            Err(RulesError::InvalidMoveText(algebraic.to_string()))
        }
    }

    pub fn as_algebraic(&self) -> String {
        to_algebraic_square(self.row, self.col)
    }

    pub fn all() -> impl Iterator<Item = ChessField> {
        (0..64).map(ChessField::from_index)
    }
}

impl fmt::Display for ChessField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_algebraic())
    }
}

/// What a presentation layer asks for: source, destination and the promotion choice.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct MoveRequest {
    pub from: ChessField,
    pub to: ChessField,
    pub promotion: Option<PieceType>,
}

impl MoveRequest {
    pub fn new(from: ChessField, to: ChessField) -> Self {
        Self { from, to, promotion: None }
    }

    pub fn with_promotion(mut self, promotion: PieceType) -> Self {
        self.promotion = Some(promotion);
        self
    }

    /// Parses long algebraic notation such as `e2e4` or `e7e8q`.
    pub fn from_algebraic(algebraic: &str) -> Result<Self, RulesError> {
        let invalid = || RulesError::InvalidMoveText(algebraic.to_string());
        if !algebraic.is_ascii() || !(4..=5).contains(&algebraic.len()) {
            return Err(invalid());
        }
        let from = ChessField::from_algebraic(&algebraic[0..2]).map_err(|_| invalid())?;
        let to = ChessField::from_algebraic(&algebraic[2..4]).map_err(|_| invalid())?;

        let promotion = match algebraic.chars().nth(4) {
            None => None,
            Some(c) => match PieceType::from_char(c) {
                Some(kind) if PieceType::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(invalid()),
            },
        };
        Ok(Self { from, to, promotion })
    }

    pub fn as_algebraic(&self) -> String {
        let base_move = format!("{}{}", self.from, self.to);
        if let Some(promo) = self.promotion {
            base_move + &promo.to_string().to_lowercase()
        } else {
            base_move
        }
    }
}

impl FromStr for MoveRequest {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_algebraic(s.trim())
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_algebraic())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Move {
    pub from: ChessField,
    pub to: ChessField,
    pub moved_piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promotion: Option<PieceType>,
    pub is_castle: bool,
    pub is_en_passant: bool,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    pub fn as_algebraic(&self) -> String {
        self.request().as_algebraic()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_algebraic())
    }
}

pub fn to_algebraic_square(row: u8, col: u8) -> String {
    if row < 8 && col < 8 {
        let file = (b'a' + col) as char;
        let rank = (b'1' + row) as char;
        format!("{}{}", file, rank)
    } else {
        format!("({},{})", row, col)
    }
}
