use serde::{Deserialize, Serialize};

/// A square on the board. x is the file (0 = a), y is the rank with y = 0 at
/// Black's back rank and y = 7 at White's.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub fn new(x: i8, y: i8) -> Self {
        Position { x, y }
    }

    /// Offset by a direction, without bounds checking.
    pub fn offset(self, dx: i8, dy: i8) -> Self {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn on_board(self) -> bool {
        (0..8).contains(&self.x) && (0..8).contains(&self.y)
    }

    /// Algebraic square name, e.g. (4,6) -> "e2".
    pub fn square_notation(self) -> String {
        format!("{}{}", self.file_notation(), 8 - self.y)
    }

    /// File letter only, e.g. (4,6) -> "e".
    pub fn file_notation(self) -> char {
        (b'a' + self.x as u8) as char
    }

    /// The up-to-eight adjacent squares, clipped to the board.
    pub fn neighbors(self) -> Vec<Position> {
        let mut squares = Vec::with_capacity(8);
        for (dx, dy) in [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ] {
            let target = self.offset(dx, dy);
            if target.on_board() {
                squares.push(target);
            }
        }
        squares
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Algebraic notation letter; pawns have none.
    pub fn notation_letter(self) -> &'static str {
        match self {
            PieceKind::King => "K",
            PieceKind::Queen => "Q",
            PieceKind::Rook => "R",
            PieceKind::Bishop => "B",
            PieceKind::Knight => "N",
            PieceKind::Pawn => "",
        }
    }
}

/// A piece on the board. `position` caches the cell the piece occupies and
/// must agree with the grid after every completed move.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
    pub position: Position,
    pub has_moved: bool,
}

impl Piece {
    fn new(kind: PieceKind, color: Color, x: i8, y: i8) -> Self {
        Piece {
            kind,
            color,
            position: Position::new(x, y),
            has_moved: false,
        }
    }
}

/// 8x8 grid of optional pieces plus cached king positions. The cell at each
/// cached position always holds a king of that color.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(rename = "board")]
    pub grid: [[Option<Piece>; 8]; 8],
    pub black_king_position: Position,
    pub white_king_position: Position,
}

impl Board {
    /// Standard chess starting position.
    pub fn new() -> Self {
        let mut grid: [[Option<Piece>; 8]; 8] = Default::default();

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (x, kind) in back_rank.into_iter().enumerate() {
            let x = x as i8;
            grid[0][x as usize] = Some(Piece::new(kind, Color::Black, x, 0));
            grid[7][x as usize] = Some(Piece::new(kind, Color::White, x, 7));
            grid[1][x as usize] = Some(Piece::new(PieceKind::Pawn, Color::Black, x, 1));
            grid[6][x as usize] = Some(Piece::new(PieceKind::Pawn, Color::White, x, 6));
        }

        Board {
            grid,
            black_king_position: Position::new(4, 0),
            white_king_position: Position::new(4, 7),
        }
    }

    /// The piece occupying a square, if any. Off-board positions yield None.
    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        if !pos.on_board() {
            return None;
        }
        self.grid[pos.y as usize][pos.x as usize].as_ref()
    }

    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.grid[pos.y as usize][pos.x as usize] = piece;
    }

    pub fn king_position(&self, color: Color) -> Position {
        match color {
            Color::White => self.white_king_position,
            Color::Black => self.black_king_position,
        }
    }

    pub fn set_king_position(&mut self, color: Color, pos: Position) {
        match color {
            Color::White => self.white_king_position = pos,
            Color::Black => self.black_king_position = pos,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}
