use serde::{Deserialize, Deserializer, Serialize};

use crate::models::board::{Piece, PieceKind, Position};

/// Inbound move as carried on the wire. `promotion` arrives as a lowercase
/// piece name or the empty string; `mine` is the mover's next mine square.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WsMove {
    pub from: Position,
    pub to: Position,
    #[serde(default, deserialize_with = "promotion_from_wire")]
    pub promotion: Option<PieceKind>,
    pub mine: Position,
}

fn promotion_from_wire<'de, D>(deserializer: D) -> Result<Option<PieceKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(name) => serde_json::from_value(serde_json::Value::String(name.to_owned()))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A bare from/to pair, the currency of move generation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleMove {
    pub from: Position,
    pub to: Position,
}

impl SimpleMove {
    pub fn new(from: Position, to: Position) -> Self {
        SimpleMove { from, to }
    }
}

/// The rook's half of a castling move, recorded on the ply for replay.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CastleRookMove {
    pub from: Position,
    pub to: Position,
}

/// One side's completed move as recorded in history. `piece` and
/// `captured_piece` are snapshots taken before the move mutated the board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ply {
    pub piece: Piece,
    pub from: Position,
    pub to: Position,
    pub captured_piece: Option<Piece>,
    pub castle_rook_move: Option<CastleRookMove>,
    pub promotion: Option<PieceKind>,
    pub notation: String,
}

/// White's ply plus, once played, Black's reply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovePair {
    pub white_ply: Ply,
    pub black_ply: Option<Ply>,
}
