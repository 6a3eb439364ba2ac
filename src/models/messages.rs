use actix::Message;
use serde::{Deserialize, Serialize};

use crate::models::game_state::GameState;

/// Message types carried on the game session stream. `move` is the only
/// client-originated type; `gameState` and `error` are server push.
pub const MSG_TYPE_MOVE: &str = "move";
pub const MSG_TYPE_GAME_STATE: &str = "gameState";
pub const MSG_TYPE_ERROR: &str = "error";

/// Envelope for every message on the bidirectional game stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WsEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl WsEnvelope {
    pub fn game_state(state: &GameState) -> Result<Self, serde_json::Error> {
        Ok(WsEnvelope {
            kind: MSG_TYPE_GAME_STATE.to_owned(),
            payload: serde_json::to_value(state)?,
        })
    }

    pub fn error(message: &str) -> Self {
        WsEnvelope {
            kind: MSG_TYPE_ERROR.to_owned(),
            payload: serde_json::Value::String(message.to_owned()),
        }
    }
}

/// One-shot matchmaking notification: the game to join and the seat assigned.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MatchFoundEvent {
    pub game_id: String,
    pub color: String,
}

/// Pre-serialized frame pushed to a session actor's outbound socket.
#[derive(Message)]
#[rtype(result = "()")]
pub struct OutboundText(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let envelope: WsEnvelope = serde_json::from_str(
            r#"{"type":"move","payload":{"from":{"x":4,"y":6},"to":{"x":4,"y":4},"promotion":"","mine":{"x":0,"y":0}}}"#,
        )
        .unwrap();
        assert_eq!(envelope.kind, MSG_TYPE_MOVE);
        assert!(envelope.payload.is_object());
    }

    #[test]
    fn error_envelope_carries_plain_string() {
        let json = serde_json::to_value(WsEnvelope::error("not your turn")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"], "not your turn");
    }

    #[test]
    fn match_found_event_wire_shape() {
        let json = serde_json::to_value(MatchFoundEvent {
            game_id: "g1".to_owned(),
            color: "white".to_owned(),
        })
        .unwrap();
        assert_eq!(json["gameId"], "g1");
        assert_eq!(json["color"], "white");
    }
}
