pub mod engine;
pub mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use actix::Recipient;
use log::{info, warn};

use crate::game::error::{GameError, GameResult};
use crate::models::board::{Color, PieceKind, Position};
use crate::models::clock::Clock;
use crate::models::game_state::{GameState, INITIAL_TIME};
use crate::models::messages::{OutboundText, WsEnvelope};
use crate::models::moves::{CastleRookMove, MovePair, Ply, SimpleMove, WsMove};

/// A single game: authoritative state, the hidden mine overlay, both clocks,
/// and the sinks of every connected observer.
///
/// The state mutex serializes all writers; the connection map has its own
/// read/write lock so broadcasts never stall move application. Outbound
/// frames are serialized under the state lock but written outside all locks.
pub struct Game {
    pub id: String,
    inner: Mutex<Inner>,
    white_clock: Clock,
    black_clock: Clock,
    connections: RwLock<HashMap<String, Sink>>,
    next_sink_token: AtomicU64,
}

struct Inner {
    state: GameState,
    /// The active mine square, set by the previous mover. Hidden from
    /// snapshots; only `state.last_mine` is published.
    mine: Option<Position>,
}

struct Sink {
    token: u64,
    recipient: Recipient<OutboundText>,
}

impl Game {
    pub fn new(id: String) -> Self {
        Game {
            id,
            inner: Mutex::new(Inner {
                state: GameState::new(),
                mine: None,
            }),
            white_clock: Clock::new(INITIAL_TIME),
            black_clock: Clock::new(INITIAL_TIME),
            connections: RwLock::new(HashMap::new()),
            next_sink_token: AtomicU64::new(1),
        }
    }

    fn clock(&self, color: Color) -> &Clock {
        match color {
            Color::White => &self.white_clock,
            Color::Black => &self.black_clock,
        }
    }

    /// Seat a player on the first free side. Errors once both seats are taken.
    pub fn add_player(&self, player_id: &str) -> GameResult<Color> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .state
            .seat_player(player_id)
            .ok_or(GameError::GameFull)
    }

    /// A copy of the current authoritative state.
    pub fn state(&self) -> GameState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn is_player(&self, player_id: &str) -> bool {
        self.inner.lock().unwrap().state.is_player(player_id)
    }

    /// Validate and apply a move, then push the resulting snapshot to every
    /// observer. On bounds/legality failures the unchanged state is
    /// re-broadcast so optimistic clients fall back in line.
    pub fn apply_move(&self, mv: WsMove) -> GameResult<()> {
        let (result, frame) = {
            let mut inner = self.inner.lock().unwrap();
            let result = self.apply_move_locked(&mut inner, mv);
            let broadcast = matches!(
                result,
                Ok(()) | Err(GameError::OutOfBounds) | Err(GameError::NotLegal)
            );
            let frame = if broadcast {
                self.make_frame(&inner.state)
            } else {
                None
            };
            (result, frame)
        };

        if let Some(frame) = frame {
            self.send_frame(&frame);
        }
        result
    }

    fn apply_move_locked(&self, inner: &mut Inner, mv: WsMove) -> GameResult<()> {
        if inner.state.resolve.is_some() {
            return Err(GameError::GameOver);
        }
        if !mv.from.on_board() || !mv.to.on_board() {
            return Err(GameError::OutOfBounds);
        }
        let Some(piece) = inner.state.board.piece_at(mv.from).copied() else {
            return Err(GameError::NoPieceAtSquare);
        };
        let mover = inner.state.to_move;
        if piece.color != mover {
            return Err(GameError::NotYourTurn);
        }

        let wanted = SimpleMove::new(mv.from, mv.to);
        let legal =
            engine::legal_moves_for_piece(&mut inner.state.board, mv.from, inner.state.en_passant_target);
        if !legal.contains(&wanted) {
            return Err(GameError::NotLegal);
        }

        self.clock(mover).stop();

        let mut ply = Ply {
            piece,
            from: mv.from,
            to: mv.to,
            captured_piece: inner.state.board.piece_at(mv.to).copied(),
            castle_rook_move: None,
            promotion: None,
            notation: engine::notation(&inner.state.board, &piece, mv.to, inner.mine),
        };

        // Sound is decided against the pre-move board: a non-pawn landing on
        // the mine explodes, otherwise occupation means capture.
        let landing_on_mine = inner.mine == Some(mv.to);
        if landing_on_mine && piece.kind != PieceKind::Pawn {
            inner.state.sound = "explosion".to_owned();
        } else if let Some(captured) = inner.state.board.piece_at(mv.to).copied() {
            inner.state.sound = "capture".to_owned();
            match mover {
                Color::White => inner.state.captured_pieces.white.push(captured),
                Color::Black => inner.state.captured_pieces.black.push(captured),
            }
        } else {
            inner.state.sound = "move".to_owned();
        }

        // Move the piece.
        let mut moved = piece;
        moved.has_moved = true;
        moved.position = mv.to;

        if let Some(kind) = mv.promotion {
            let last_rank = match mover {
                Color::White => 0,
                Color::Black => 7,
            };
            if piece.kind == PieceKind::Pawn && mv.to.y == last_rank {
                moved.kind = kind;
                ply.promotion = Some(kind);
            }
        }

        inner.state.board.set(mv.from, None);
        inner.state.board.set(mv.to, Some(moved));

        if piece.kind == PieceKind::King {
            self.handle_castle(inner, &mv, &mut ply);
            inner.state.board.set_king_position(mover, mv.to);
        } else if piece.kind == PieceKind::Pawn {
            self.handle_en_passant(inner, &mv, mover, &mut ply);
        }

        // The target square only survives for the immediately following move.
        inner.state.en_passant_target =
            if piece.kind == PieceKind::Pawn && (mv.to.y - mv.from.y).abs() == 2 {
                Some(Position::new(mv.to.x, (mv.to.y + mv.from.y) / 2))
            } else {
                None
            };

        match mover {
            Color::White => inner.state.move_history.push(MovePair {
                white_ply: ply,
                black_ply: None,
            }),
            Color::Black => match inner.state.move_history.last_mut() {
                Some(pair) => pair.black_ply = Some(ply),
                None => warn!("game {}: black ply with empty history", self.id),
            },
        }

        // Detonation removes the arriving piece (post-promotion kind; kings
        // are immune) and may expose the mover's own king: bombmate.
        let mut terminal_before_switch = false;
        if landing_on_mine && moved.kind != PieceKind::King && moved.kind != PieceKind::Pawn {
            inner.state.explosion = Some(mv.to);
            if let Some(destroyed) = inner.state.board.piece_at(mv.to).copied() {
                match mover {
                    Color::White => inner.state.captured_pieces.black.push(destroyed),
                    Color::Black => inner.state.captured_pieces.white.push(destroyed),
                }
            }
            inner.state.board.set(mv.to, None);

            if engine::is_king_in_check(&inner.state.board, mover) {
                inner.state.resolve =
                    Some(format!("{} wins by Bombmate", mover.other().as_str()));
                terminal_before_switch = true;
            }
        } else {
            inner.state.explosion = None;
        }

        inner.state.white_king_attacked_squares =
            inner.state.board.white_king_position.neighbors();
        inner.state.black_king_attacked_squares =
            inner.state.board.black_king_position.neighbors();

        // Shift the mine: last becomes visible, the mover's designation arms.
        inner.state.last_mine = inner.mine;
        inner.mine = Some(mv.mine);

        inner.state.to_move = mover.other();
        let next = inner.state.to_move;
        inner.state.is_check = engine::is_king_in_check(&inner.state.board, next);

        if engine::has_no_legal_moves(&mut inner.state.board, next, inner.state.en_passant_target)
            && inner.state.resolve.is_none()
        {
            inner.state.resolve = Some(if inner.state.is_check {
                format!("{} wins by Checkmate", mover.as_str())
            } else {
                "draw by Stalemate".to_owned()
            });
        }

        if inner.state.is_check && !terminal_before_switch {
            inner.state.sound = "check".to_owned();
        }

        inner.state.last_move = Some(wanted);

        if inner.state.resolve.is_none() {
            self.clock(next).start();
        }
        inner.state.players.white.time_left =
            (self.white_clock.remaining().as_millis() / 100) as i64;
        inner.state.players.black.time_left =
            (self.black_clock.remaining().as_millis() / 100) as i64;

        Ok(())
    }

    fn handle_castle(&self, inner: &mut Inner, mv: &WsMove, ply: &mut Ply) {
        if (mv.from.x - mv.to.x).abs() != 2 {
            return;
        }
        let rank = mv.from.y;
        let (rook_from, rook_to, notation) = if mv.to.x == 2 {
            (Position::new(0, rank), Position::new(3, rank), "O-O-O")
        } else {
            (Position::new(7, rank), Position::new(5, rank), "O-O")
        };

        if let Some(mut rook) = inner.state.board.piece_at(rook_from).copied() {
            rook.position = rook_to;
            rook.has_moved = true;
            inner.state.board.set(rook_from, None);
            inner.state.board.set(rook_to, Some(rook));
            ply.castle_rook_move = Some(CastleRookMove {
                from: rook_from,
                to: rook_to,
            });
            ply.notation = notation.to_owned();
        }
    }

    fn handle_en_passant(&self, inner: &mut Inner, mv: &WsMove, mover: Color, ply: &mut Ply) {
        if inner.state.en_passant_target != Some(mv.to) {
            return;
        }
        let behind = match mover {
            Color::White => mv.to.offset(0, 1),
            Color::Black => mv.to.offset(0, -1),
        };
        if let Some(captured) = inner.state.board.piece_at(behind).copied() {
            match mover {
                Color::White => inner.state.captured_pieces.white.push(captured),
                Color::Black => inner.state.captured_pieces.black.push(captured),
            }
            inner.state.board.set(behind, None);
        }
        ply.notation = format!("x{}", ply.notation);
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an observer sink. One sink per player id; admission requires
    /// a seat in this game, or a free seat (spectators may watch until the
    /// game fills). Returns a token for [`Game::unsubscribe`]. The current
    /// snapshot is pushed immediately.
    pub fn subscribe(&self, player_id: &str, sink: Recipient<OutboundText>) -> GameResult<u64> {
        let authorized = {
            let inner = self.inner.lock().unwrap();
            inner.state.is_player(player_id) || !inner.state.is_full()
        };
        if !authorized {
            return Err(GameError::NotAuthorized);
        }

        let token = self.next_sink_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut connections = self.connections.write().unwrap();
            if connections.contains_key(player_id) {
                return Err(GameError::ConnectionExists);
            }
            connections.insert(
                player_id.to_owned(),
                Sink {
                    token,
                    recipient: sink,
                },
            );
        }
        info!("game {}: registered connection for player {}", self.id, player_id);

        self.broadcast_state();
        Ok(token)
    }

    /// Remove a sink, but only if it is still the one registered under the
    /// token. A newer connection for the same player stays untouched.
    pub fn unsubscribe(&self, player_id: &str, token: u64) {
        let mut connections = self.connections.write().unwrap();
        if connections.get(player_id).map_or(false, |s| s.token == token) {
            connections.remove(player_id);
            info!("game {}: unregistered connection for player {}", self.id, player_id);
        }
    }

    /// Serialize the current state and push it to every sink.
    pub fn broadcast_state(&self) {
        let frame = {
            let inner = self.inner.lock().unwrap();
            self.make_frame(&inner.state)
        };
        if let Some(frame) = frame {
            self.send_frame(&frame);
        }
    }

    fn make_frame(&self, state: &GameState) -> Option<String> {
        let envelope = match WsEnvelope::game_state(state) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("game {}: failed to serialize state: {}", self.id, err);
                return None;
            }
        };
        match serde_json::to_string(&envelope) {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!("game {}: failed to serialize frame: {}", self.id, err);
                None
            }
        }
    }

    /// Fire-and-forget write to every sink; a failed write drops the sink.
    fn send_frame(&self, frame: &str) {
        let sinks: Vec<(String, Recipient<OutboundText>)> = {
            let connections = self.connections.read().unwrap();
            connections
                .iter()
                .map(|(id, sink)| (id.clone(), sink.recipient.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (player_id, recipient) in sinks {
            if recipient.try_send(OutboundText(frame.to_owned())).is_err() {
                warn!(
                    "game {}: failed to send state to player {}, dropping sink",
                    self.id, player_id
                );
                dead.push(player_id);
            }
        }
        if !dead.is_empty() {
            let mut connections = self.connections.write().unwrap();
            for player_id in dead {
                connections.remove(&player_id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Clock expiry
    // ------------------------------------------------------------------

    /// Spawn a deadline watcher for the currently running clock. Watchers
    /// from superseded moves wake, find the turn has passed, and exit.
    pub fn watch_clock(game: Arc<Game>) {
        let Some((side, remaining)) = game.running_clock() else {
            return;
        };
        actix_web::rt::spawn(async move {
            // Small slack so the deadline check sees an exhausted clock.
            actix_web::rt::time::sleep(remaining + Duration::from_millis(20)).await;
            game.expire_clock(side);
        });
    }

    fn running_clock(&self) -> Option<(Color, Duration)> {
        let side = {
            let inner = self.inner.lock().unwrap();
            if inner.state.resolve.is_some() {
                return None;
            }
            inner.state.to_move
        };
        let clock = self.clock(side);
        if clock.is_running() {
            Some((side, clock.remaining()))
        } else {
            None
        }
    }

    /// Declare a loss on time if `side` is still to move with an exhausted
    /// clock and the game has no resolution yet.
    pub fn expire_clock(&self, side: Color) {
        let expired = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state.resolve.is_some() || inner.state.to_move != side {
                false
            } else {
                let clock = self.clock(side);
                if clock.remaining().is_zero() {
                    clock.stop();
                    inner.state.resolve =
                        Some(format!("{} wins on time", side.other().as_str()));
                    inner.state.players.white.time_left =
                        (self.white_clock.remaining().as_millis() / 100) as i64;
                    inner.state.players.black.time_left =
                        (self.black_clock.remaining().as_millis() / 100) as i64;
                    true
                } else {
                    false
                }
            }
        };
        if expired {
            info!("game {}: {} flagged on time", self.id, side.as_str());
            self.broadcast_state();
        }
    }
}
