pub mod handler;

pub use handler::{game_session, GameSession};
