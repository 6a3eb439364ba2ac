use std::sync::Arc;

use actix::{Actor, ActorContext, AsyncContext, Handler, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};
use log::{debug, info, warn};

use crate::game::error::GameError;
use crate::game::Game;
use crate::identity::PlayerId;
use crate::models::messages::{OutboundText, WsEnvelope, MSG_TYPE_MOVE};
use crate::models::moves::WsMove;
use crate::service::GameManager;

/// One player's (or spectator's) live connection to a game: subscribes its
/// sink on start, feeds inbound `move` messages to the game, and relays
/// every broadcast frame back out.
pub struct GameSession {
    game: Arc<Game>,
    player_id: String,
    manager: web::Data<GameManager>,
    subscription: Option<u64>,
}

impl Actor for GameSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let sink = ctx.address().recipient();
        match self.game.subscribe(&self.player_id, sink) {
            Ok(token) => {
                self.subscription = Some(token);
                info!(
                    "session started for player {} in game {}",
                    self.player_id, self.game.id
                );
            }
            Err(err) => {
                warn!(
                    "rejected session for player {} in game {}: {}",
                    self.player_id, self.game.id, err
                );
                ctx.close(Some(CloseReason {
                    code: CloseCode::Normal,
                    description: Some(err.to_string()),
                }));
                ctx.stop();
            }
        }
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if let Some(token) = self.subscription.take() {
            self.game.unsubscribe(&self.player_id, token);
        }
        info!(
            "session closed for player {} in game {}",
            self.player_id, self.game.id
        );
        Running::Stop
    }
}

/// Broadcast frames arrive as actor messages and go straight to the socket.
impl Handler<OutboundText> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<WsEnvelope>(&text) {
                Ok(envelope) => {
                    if let Err(message) = self.dispatch(envelope) {
                        self.send_error(ctx, &message);
                    }
                }
                Err(err) => {
                    debug!("unparseable message from player {}: {}", self.player_id, err);
                    self.send_error(ctx, &format!("invalid message format: {}", err));
                }
            },
            Ok(ws::Message::Binary(_)) => {
                self.send_error(ctx, "binary messages are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl GameSession {
    fn dispatch(&self, envelope: WsEnvelope) -> Result<(), String> {
        match envelope.kind.as_str() {
            MSG_TYPE_MOVE => {
                let mv: WsMove = serde_json::from_value(envelope.payload)
                    .map_err(|err| format!("invalid message format: {}", err))?;
                debug!(
                    "player {} moves {:?} -> {:?} in game {}",
                    self.player_id, mv.from, mv.to, self.game.id
                );
                self.manager
                    .make_move(&self.game.id, mv)
                    .map_err(|err| err.to_string())
            }
            other => Err(GameError::UnknownMessageType(other.to_owned()).to_string()),
        }
    }

    fn send_error(&self, ctx: &mut ws::WebsocketContext<Self>, message: &str) {
        match serde_json::to_string(&WsEnvelope::error(message)) {
            Ok(frame) => ctx.text(frame),
            Err(err) => warn!("failed to serialize error frame: {}", err),
        }
    }
}

/// WebSocket entry point: `GET /ws/game/{game_id}`.
pub async fn game_session(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    player: PlayerId,
    manager: web::Data<GameManager>,
) -> Result<HttpResponse, Error> {
    let game_id = path.into_inner();
    let game = match manager.get_game(&game_id) {
        Ok(game) => game,
        Err(err) => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": err.to_string(),
            })))
        }
    };

    let session = GameSession {
        game,
        player_id: player.0,
        manager,
        subscription: None,
    };
    ws::start(session, &req, stream)
}
