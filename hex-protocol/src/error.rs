//! Protocol-boundary errors: malformed frames that never reach game logic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame was not valid UTF-8 text")]
    NotText,
}
