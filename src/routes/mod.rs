use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::{web, HttpResponse, Responder};
use futures::channel::mpsc;
use futures::Stream;
use serde_json::json;

use crate::game::error::GameError;
use crate::identity::PlayerId;
use crate::service::GameManager;
use crate::websocket;

/// Configure the HTTP routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/game")
            .route("/create", web::post().to(create_game))
            .route("/matchmaking/join", web::post().to(join_matchmaking))
            .route("/matchmaking/events", web::get().to(matchmaking_events))
            .route("/join/{game_id}", web::post().to(join_game))
            .route("/{game_id}", web::get().to(get_game_state)),
    )
    .service(web::resource("/ws/game/{game_id}").route(web::get().to(websocket::game_session)));
}

fn error_response(err: GameError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        GameError::GameNotFound => HttpResponse::NotFound().json(body),
        GameError::GameFull | GameError::AlreadyQueued => HttpResponse::Conflict().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn create_game(manager: web::Data<GameManager>) -> impl Responder {
    let game_id = manager.create_game();
    HttpResponse::Ok().json(json!({
        "message": "Game created",
        "game_id": game_id,
    }))
}

async fn join_game(
    manager: web::Data<GameManager>,
    path: web::Path<String>,
    player: PlayerId,
) -> impl Responder {
    match manager.join_game(&path.into_inner(), &player.0) {
        Ok(color) => HttpResponse::Ok().json(json!({
            "message": "Game joined",
            "color": color.as_str(),
        })),
        Err(err) => error_response(err),
    }
}

async fn get_game_state(
    manager: web::Data<GameManager>,
    path: web::Path<String>,
) -> impl Responder {
    match manager.game_state(&path.into_inner()) {
        Ok(state) => HttpResponse::Ok().json(state),
        Err(err) => error_response(err),
    }
}

async fn join_matchmaking(manager: web::Data<GameManager>, player: PlayerId) -> impl Responder {
    match manager.join_matchmaking(&player.0) {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "queued" })),
        Err(err) => error_response(err),
    }
}

/// Server-push stream of matchmaking events: emits exactly one
/// `data: {gameId, color}` event, then the matchmaker closes the channel.
async fn matchmaking_events(manager: web::Data<GameManager>, player: PlayerId) -> impl Responder {
    let (tx, rx) = mpsc::channel(1);
    let token = manager.register_matchmaking_sink(&player.0, tx);
    let stream = MatchEventStream {
        player_id: player.0,
        token,
        manager: manager.into_inner(),
        rx,
    };

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// Wraps the one-shot channel so a client disconnect tears down the pending
/// sink. The token keeps a stale teardown from removing a newer registration.
struct MatchEventStream {
    player_id: String,
    token: u64,
    manager: Arc<GameManager>,
    rx: mpsc::Receiver<String>,
}

impl Stream for MatchEventStream {
    type Item = Result<web::Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.rx).poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Ok(web::Bytes::from(format!(
                "data: {}\n\n",
                event
            ))))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for MatchEventStream {
    fn drop(&mut self) {
        self.manager
            .unregister_matchmaking_sink(&self.player_id, self.token);
    }
}
