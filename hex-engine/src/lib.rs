//! The authoritative game engine: per-room state machine, map/card
//! provisioning, and actor bookkeeping. Transport-agnostic; `hex-server`
//! drives a [`RoomState`] from the outside with decoded protocol messages.

pub mod actor;
pub mod error;
pub mod id_assigner;
pub mod map_provider;
pub mod room;

pub use actor::Actor;
pub use error::EngineError;
pub use id_assigner::IdAssigner;
pub use map_provider::{MapProvider, RandomMapProvider};
pub use room::RoomState;
