//! MineChess server core: a real-time two-player chess variant where every
//! move also plants a hidden mine that detonates an enemy non-pawn piece
//! landing on it the following turn.
//!
//! - `models` — board, pieces, clocks, queue, and the wire-facing state types
//! - `game` — the rules engine and the per-game envelope that serializes
//!   moves and fans snapshots out to observers
//! - `service` — the game registry and the matchmaking coordinator
//! - `websocket` / `routes` — session adapter and HTTP surface

pub mod game;
pub mod identity;
pub mod models;
pub mod routes;
pub mod service;
pub mod websocket;
