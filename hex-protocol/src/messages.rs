//! The wire protocol: tagged-union messages exchanged over the transport.
//!
//! Every message is a single JSON object discriminated by a `"type"` field,
//! per the redesign away from positional/polymorphic framing. Enum-valued
//! fields serialize as their integer discriminant via `serde_repr`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hex_coord::HexCoord;
use crate::types::{
    Action, ActorState, Card, ObjectiveMessage, Role, TurnState,
};

/// A single map tile; terrain data only, props travel in [`PropUpdate`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tile {
    pub asset_id: u32,
    pub coord: HexCoord,
    pub height: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapUpdate {
    pub rows: i32,
    pub cols: i32,
    pub tiles: Vec<Tile>,
}

/// A prop is either a selectable card or plain scenery.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "prop_type")]
pub enum Prop {
    Card(Card),
    Decoration { asset_id: u32, location: HexCoord, rotation_deg: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropUpdate {
    pub props: Vec<Prop>,
}

/// The queue an unjoined client is requesting to enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueType {
    LeaderOnly,
    FollowerOnly,
    Default,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub joined: bool,
    pub role: Role,
    pub place_in_queue: u32,
    pub booted_from_queue: bool,
}

/// Messages a client may send to the room.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageToServer {
    Actions { actions: Vec<Action> },
    Objective { text: String },
    ObjectiveCompleted { uuid: String },
    TurnComplete,
    StateSyncRequest,
    JoinQueue,
    JoinLeaderQueue,
    JoinFollowerQueue,
    Leave,
    Pong,
    Instruction { text: String },
    InstructionDone { uuid: String },
    Interrupt,
    PositiveFeedback,
    NegativeFeedback,
}

/// Messages the room may send to a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageFromServer {
    Actions { actions: Vec<Action> },
    StateSync { actors: Vec<ActorState> },
    MapUpdate(MapUpdate),
    PropUpdate(PropUpdate),
    GameState(TurnState),
    Objective { list: Vec<ObjectiveMessage> },
    RoomManagement(JoinResponse),
    Ping,
    LiveFeedback { positive: bool },
    StateMachineTick,
}

/// Wraps an outbound message with an ISO-8601 transmission timestamp, as
/// every frame leaving the server carries one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transmission<T> {
    pub transmission_time: DateTime<Utc>,
    #[serde(flatten)]
    pub message: T,
}

impl<T> Transmission<T> {
    pub fn now(message: T) -> Transmission<T> {
        Transmission { transmission_time: Utc::now(), message }
    }
}
