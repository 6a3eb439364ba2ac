use thiserror::Error;

/// Errors surfaced to clients. The display strings are the wire contract:
/// validation errors travel back on the game stream as `error` messages,
/// lifecycle errors on their originating request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("no piece at from square")]
    NoPieceAtSquare,

    #[error("invalid move, out of bounds")]
    OutOfBounds,

    #[error("invalid move, not legal")]
    NotLegal,

    #[error("game is over")]
    GameOver,

    #[error("game not found")]
    GameNotFound,

    #[error("game is full")]
    GameFull,

    #[error("player already in queue")]
    AlreadyQueued,

    #[error("connection already exists")]
    ConnectionExists,

    #[error("not authorized to join this game")]
    NotAuthorized,

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
}

/// Result alias for game operations.
pub type GameResult<T> = Result<T, GameError>;
