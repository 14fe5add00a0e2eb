//! Wire types shared by the server and the client mirror: hex coordinates,
//! actions, cards, turn state, and the tagged-union message protocol.

pub mod config;
pub mod error;
pub mod hex_coord;
pub mod messages;
pub mod types;

pub use config::Config;
pub use error::ProtocolError;
pub use hex_coord::HexCoord;
pub use messages::{
    JoinResponse, MapUpdate, MessageFromServer, MessageToServer, Prop, PropUpdate, QueueType,
    Tile, Transmission,
};
pub use types::{
    Action, ActionType, ActorState, AnimationType, Card, CardColor, CardShape, Color,
    ObjectiveCompleteMessage, ObjectiveMessage, Role, TurnState, FOLLOWER_MOVES_PER_TURN,
    LEADER_MOVES_PER_TURN, turn_duration_seconds,
};
