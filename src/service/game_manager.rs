use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::channel::mpsc;
use log::{info, warn};
use uuid::Uuid;

use crate::game::error::{GameError, GameResult};
use crate::game::Game;
use crate::models::board::Color;
use crate::models::game_state::GameState;
use crate::models::messages::MatchFoundEvent;
use crate::models::moves::WsMove;
use crate::models::queue::MatchQueue;

/// One-shot matchmaking notification sink: the matchmaker is the only sender
/// and drops the sender after delivery, which closes the player's stream.
pub type MatchSender = mpsc::Sender<String>;

struct PendingSink {
    token: u64,
    sender: MatchSender,
}

/// Owns every live game, the matchmaking queue, and the pending notification
/// sinks. The registry lock is never held across game calls or sink I/O.
pub struct GameManager {
    games: RwLock<HashMap<String, Arc<Game>>>,
    queue: MatchQueue,
    matchmaking: Mutex<HashMap<String, PendingSink>>,
    next_sink_token: AtomicU64,
}

impl GameManager {
    pub fn new() -> Self {
        GameManager {
            games: RwLock::new(HashMap::new()),
            queue: MatchQueue::new(),
            matchmaking: Mutex::new(HashMap::new()),
            next_sink_token: AtomicU64::new(1),
        }
    }

    /// Allocate an empty game and return its id.
    pub fn create_game(&self) -> String {
        let game_id = Uuid::new_v4().to_string();
        let game = Arc::new(Game::new(game_id.clone()));
        self.games.write().unwrap().insert(game_id.clone(), game);
        info!("created game {}", game_id);
        game_id
    }

    pub fn get_game(&self, game_id: &str) -> GameResult<Arc<Game>> {
        self.games
            .read()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or(GameError::GameNotFound)
    }

    pub fn join_game(&self, game_id: &str, player_id: &str) -> GameResult<Color> {
        let game = self.get_game(game_id)?;
        let color = game.add_player(player_id)?;
        info!(
            "player {} joined game {} as {}",
            player_id,
            game_id,
            color.as_str()
        );
        Ok(color)
    }

    pub fn game_state(&self, game_id: &str) -> GameResult<GameState> {
        Ok(self.get_game(game_id)?.state())
    }

    /// Apply a move and arm the deadline watcher for the clock it started.
    pub fn make_move(&self, game_id: &str, mv: WsMove) -> GameResult<()> {
        let game = self.get_game(game_id)?;
        game.apply_move(mv)?;
        Game::watch_clock(game);
        Ok(())
    }

    pub fn join_matchmaking(&self, player_id: &str) -> GameResult<()> {
        self.queue.add_player(player_id)?;
        info!("player {} queued for matchmaking", player_id);
        Ok(())
    }

    /// Install the player's one-shot notification sink. A prior sink for the
    /// same player is closed by dropping its sender. The returned token lets
    /// a stream teardown unregister only its own sink.
    pub fn register_matchmaking_sink(&self, player_id: &str, sender: MatchSender) -> u64 {
        let token = self.next_sink_token.fetch_add(1, Ordering::Relaxed);
        let prior = self.matchmaking.lock().unwrap().insert(
            player_id.to_owned(),
            PendingSink { token, sender },
        );
        if prior.is_some() {
            info!("replaced matchmaking sink for player {}", player_id);
        }
        token
    }

    pub fn unregister_matchmaking_sink(&self, player_id: &str, token: u64) {
        let mut sinks = self.matchmaking.lock().unwrap();
        if sinks.get(player_id).map_or(false, |sink| sink.token == token) {
            sinks.remove(player_id);
        }
    }

    /// One pairing sweep: while two players wait, seat the longer-waiting as
    /// White, register the game, and fire both match notifications. Called
    /// every second by [`run_matchmaking`].
    pub fn pair_waiting_players(&self) {
        while let Some((first, second)) = self.queue.next_pair() {
            let game_id = Uuid::new_v4().to_string();
            let game = Arc::new(Game::new(game_id.clone()));

            let mut seats = Vec::with_capacity(2);
            for player_id in [&first, &second] {
                match game.add_player(player_id) {
                    Ok(color) => seats.push((player_id.clone(), color)),
                    Err(err) => warn!(
                        "failed to seat player {} in fresh game {}: {}",
                        player_id, game_id, err
                    ),
                }
            }
            self.games
                .write()
                .unwrap()
                .insert(game_id.clone(), game);
            info!("matched {} vs {} in game {}", first, second, game_id);

            // Notifications go out after the registry lock is released so a
            // gone or slow sink cannot hold up pairing.
            for (player_id, color) in seats {
                self.notify_match(&player_id, &game_id, color);
            }
        }
    }

    fn notify_match(&self, player_id: &str, game_id: &str, color: Color) {
        let event = MatchFoundEvent {
            game_id: game_id.to_owned(),
            color: color.as_str().to_owned(),
        };
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("failed to serialize match event: {}", err);
                return;
            }
        };

        let sink = self.matchmaking.lock().unwrap().remove(player_id);
        match sink {
            Some(mut sink) => {
                if let Err(err) = sink.sender.try_send(payload) {
                    warn!(
                        "failed to deliver match event to player {}: {}",
                        player_id, err
                    );
                }
                // Dropping the sender here closes the one-shot stream.
            }
            None => warn!("no matchmaking sink registered for player {}", player_id),
        }
    }
}

impl Default for GameManager {
    fn default() -> Self {
        GameManager::new()
    }
}

/// Background pairing loop, one sweep per second.
pub fn run_matchmaking(manager: Arc<GameManager>) {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            manager.pair_waiting_players();
        }
    });
}
