//! A headless client for driving a room programmatically: join a queue,
//! submit actions turn by turn, and read back the server's authoritative
//! state. Built for scripted agents and tests, not for a human player.

pub mod connection;
pub mod error;
pub mod game;

pub use connection::Connection;
pub use error::ClientError;
pub use game::{Game, Observation};
pub use hex_protocol::QueueType;
