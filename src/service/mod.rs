pub mod game_manager;

pub use game_manager::{run_matchmaking, GameManager, MatchSender};
