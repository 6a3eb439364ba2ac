use std::collections::VecDeque;
use std::sync::Mutex;

use crate::game::error::GameError;

/// FIFO of players waiting for a match. A player can be queued at most once.
pub struct MatchQueue {
    players: Mutex<VecDeque<String>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        MatchQueue {
            players: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add_player(&self, player_id: &str) -> Result<(), GameError> {
        let mut players = self.players.lock().unwrap();
        if players.iter().any(|id| id == player_id) {
            return Err(GameError::AlreadyQueued);
        }
        players.push_back(player_id.to_owned());
        Ok(())
    }

    /// Remove and return the two longest-waiting players, oldest first.
    pub fn next_pair(&self) -> Option<(String, String)> {
        let mut players = self.players.lock().unwrap();
        if players.len() < 2 {
            return None;
        }
        let first = players.pop_front().unwrap();
        let second = players.pop_front().unwrap();
        Some((first, second))
    }

    pub fn len(&self) -> usize {
        self.players.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        MatchQueue::new()
    }
}
