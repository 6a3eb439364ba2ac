use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::board::{Board, Color, Piece, PieceKind, Position};
use crate::models::moves::{MovePair, SimpleMove};
use crate::models::player::ClientPlayer;

/// Starting time per side.
pub const INITIAL_TIME: Duration = Duration::from_secs(1200);
/// The same, in the wire unit (milliseconds / 100).
pub const INITIAL_TIME_DECISECONDS: i64 = 12000;

/// Pieces each side has captured so far.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CapturedPieces {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Players {
    pub white: ClientPlayer,
    pub black: ClientPlayer,
}

/// Authoritative per-game state, broadcast as-is to every observer after each
/// applied move. Field names are the wire contract.
///
/// `selected_square`, `legal_moves`, `promotion_square`, `promotion_piece`
/// and `pending_move_destination` exist for client-side rendering and stay
/// empty on the server. `mine` likewise stays null in broadcasts: the active
/// mine is hidden information, only `last_mine` is revealed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub sound: String,
    #[serde(rename = "boardState")]
    pub board: Board,
    pub to_move: Color,
    pub move_history: Vec<MovePair>,
    pub captured_pieces: CapturedPieces,
    pub is_check: bool,
    pub selected_square: Option<Position>,
    pub legal_moves: Vec<Position>,
    pub en_passant_target: Option<Position>,
    pub resolve: Option<String>,
    pub players: Players,
    pub promotion_square: Option<Position>,
    pub promotion_piece: Option<PieceKind>,
    pub mine: Option<Position>,
    pub last_mine: Option<Position>,
    pub pending_move_destination: Option<Position>,
    pub last_move: Option<SimpleMove>,
    pub explosion: Option<Position>,
    pub white_king_attacked_squares: Vec<Position>,
    pub black_king_attacked_squares: Vec<Position>,
}

impl GameState {
    pub fn new() -> Self {
        let board = Board::new();
        let white_halo = board.white_king_position.neighbors();
        let black_halo = board.black_king_position.neighbors();
        GameState {
            sound: String::new(),
            board,
            to_move: Color::White,
            move_history: Vec::new(),
            captured_pieces: CapturedPieces {
                white: Vec::new(),
                black: Vec::new(),
            },
            is_check: false,
            selected_square: None,
            legal_moves: Vec::new(),
            en_passant_target: None,
            resolve: None,
            players: Players {
                white: ClientPlayer::empty(),
                black: ClientPlayer::empty(),
            },
            promotion_square: None,
            promotion_piece: None,
            mine: None,
            last_mine: None,
            pending_move_destination: None,
            last_move: None,
            explosion: None,
            white_king_attacked_squares: white_halo,
            black_king_attacked_squares: black_halo,
        }
    }

    pub fn is_full(&self) -> bool {
        !self.players.white.id.is_empty() && !self.players.black.id.is_empty()
    }

    pub fn is_player(&self, player_id: &str) -> bool {
        (!self.players.white.id.is_empty() && self.players.white.id == player_id)
            || (!self.players.black.id.is_empty() && self.players.black.id == player_id)
    }

    /// Seat a player on the first free side, White first.
    pub fn seat_player(&mut self, player_id: &str) -> Option<Color> {
        if self.players.white.id.is_empty() {
            self.players.white = ClientPlayer {
                id: player_id.to_owned(),
                color: Color::White.as_str().to_owned(),
                time_left: INITIAL_TIME_DECISECONDS,
            };
            return Some(Color::White);
        }
        if self.players.black.id.is_empty() {
            self.players.black = ClientPlayer {
                id: player_id.to_owned(),
                color: Color::Black.as_str().to_owned(),
                time_left: INITIAL_TIME_DECISECONDS,
            };
            return Some(Color::Black);
        }
        None
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}
