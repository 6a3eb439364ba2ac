pub mod board;
pub mod clock;
pub mod game_state;
pub mod messages;
pub mod moves;
pub mod player;
pub mod queue;

// Re-export important types
pub use board::{Board, Color, Piece, PieceKind, Position};
pub use clock::Clock;
pub use game_state::{CapturedPieces, GameState, Players, INITIAL_TIME, INITIAL_TIME_DECISECONDS};
pub use messages::{
    MatchFoundEvent, OutboundText, WsEnvelope, MSG_TYPE_ERROR, MSG_TYPE_GAME_STATE, MSG_TYPE_MOVE,
};
pub use moves::{CastleRookMove, MovePair, Ply, SimpleMove, WsMove};
pub use player::ClientPlayer;
pub use queue::MatchQueue;
