use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest};
use uuid::Uuid;

/// Opaque player identity attached to every request, read from the
/// `X-Player-ID` header or the `player_id` cookie. Issuing and persisting
/// the id is the identity layer's job; a request arriving without one gets a
/// fresh id for its own lifetime.
pub struct PlayerId(pub String);

impl FromRequest for PlayerId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let from_header = req
            .headers()
            .get("X-Player-ID")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        let player_id = from_header
            .or_else(|| req.cookie("player_id").map(|cookie| cookie.value().to_owned()))
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        ready(Ok(PlayerId(player_id)))
    }
}
