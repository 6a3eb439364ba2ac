use serde::{Deserialize, Serialize};

/// Player record as published in game snapshots. `name` carries the opaque
/// player id; `time_left` is in deciseconds (milliseconds / 100).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientPlayer {
    #[serde(rename = "name")]
    pub id: String,
    pub color: String,
    #[serde(rename = "timeLeft")]
    pub time_left: i64,
}

impl ClientPlayer {
    pub fn empty() -> Self {
        ClientPlayer {
            id: String::new(),
            color: String::new(),
            time_left: super::game_state::INITIAL_TIME_DECISECONDS,
        }
    }
}
