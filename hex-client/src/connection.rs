//! Thin framing layer over a websocket: encode/decode the JSON protocol,
//! nothing game-specific. [`crate::game::Game`] is built on top of this.

use futures_util::{SinkExt, StreamExt};
use hex_protocol::{MessageFromServer, MessageToServer, Transmission};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::ClientError;

pub struct Connection {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    pub async fn connect(url: &str) -> Result<Connection, ClientError> {
        let (socket, _response) = connect_async(url).await?;
        Ok(Connection { socket })
    }

    pub async fn send(&mut self, msg: &MessageToServer) -> Result<(), ClientError> {
        let text = serde_json::to_string(msg)?;
        self.socket.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Returns `None` once the socket is closed; a single malformed frame
    /// is reported as an error rather than silently skipped, since client
    /// code chooses how to react (retry sync, give up, ...).
    pub async fn recv(&mut self) -> Option<Result<MessageFromServer, ClientError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => {
                    let wrapped: Result<Transmission<MessageFromServer>, _> =
                        serde_json::from_str(&text);
                    return Some(wrapped.map(|t| t.message).map_err(ClientError::from));
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}
