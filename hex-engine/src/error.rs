//! Internal engine errors. Per the error-handling design these never cross
//! the room boundary as a `Result` that terminates a session — callers
//! convert them to a desync + log at the call site.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("room already has two actors")]
    RoomFull,
}
