//! Transport seam between the session runtime and the websocket.
//!
//! The runtime only ever sees channel endpoints, so tests substitute an
//! in-memory connector and the production path pumps frames to and from
//! a `tokio-tungstenite` websocket.

use crate::{config::SessionConfig, error::SessionError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use gemini_realtime_types::client::ClientMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, warn};

/// A frame received from the transport.
#[derive(Debug)]
pub enum InboundFrame {
    /// A text payload (JSON-encoded server message).
    Text(String),
    /// The peer closed the connection.
    Closed { reason: Option<String> },
}

/// An established bidirectional connection. Dropping both endpoints
/// tears the underlying socket down.
pub struct Connection {
    pub outbound: mpsc::Sender<ClientMessage>,
    pub inbound: mpsc::Receiver<InboundFrame>,
}

/// Opens connections to the voice-agent backend.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, SessionError>;
}

/// Production connector speaking websocket to the Gemini Live endpoint.
pub struct WsConnector {
    config: SessionConfig,
}

impl WsConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Connection, SessionError> {
        let (ws_stream, _) = connect_async(self.config.url())
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        debug!("websocket connected");
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(64);
        let (in_tx, in_rx) = mpsc::channel::<InboundFrame>(64);

        // Outbound pump: ends when the session drops its sender.
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to encode outbound message");
                        continue;
                    }
                };
                if write.send(WsMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Inbound pump: forwards text frames and reports the close.
        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                let frame = match result {
                    Ok(WsMessage::Text(text)) => InboundFrame::Text(text.to_string()),
                    Ok(WsMessage::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => InboundFrame::Text(text),
                        Err(_) => {
                            warn!("dropping non-utf8 binary frame");
                            continue;
                        }
                    },
                    Ok(WsMessage::Close(frame)) => InboundFrame::Closed {
                        reason: frame.map(|f| f.reason.to_string()),
                    },
                    Ok(_) => continue,
                    Err(e) => InboundFrame::Closed {
                        reason: Some(e.to_string()),
                    },
                };
                let closed = matches!(frame, InboundFrame::Closed { .. });
                if in_tx.send(frame).await.is_err() || closed {
                    break;
                }
            }
        });

        Ok(Connection {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
