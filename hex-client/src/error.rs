use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("server closed the connection before a join response arrived")]
    NoJoinResponse,
    #[error("server rejected the join request")]
    JoinRejected,
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}
