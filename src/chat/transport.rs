//! Chat Transport
//!
//! Seams between the connection manager and the outside world. A
//! [`Connector`] opens one WebSocket and hands back a [`Link`]: a pair of
//! channels fed by a pump task that owns the socket. Dropping the link's
//! sender closes the socket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::error::{ChatError, ChatResult};
use super::machine::RoomId;
use super::message::WireMessage;

/// Events reported by an open transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text frame from the server
    Frame(String),
    /// The server closed the socket
    Closed,
    /// The socket failed
    Error(String),
}

/// Channels to one open socket
#[derive(Debug)]
pub struct Link {
    /// Text frames to send; drop to close the socket
    pub outbound: mpsc::UnboundedSender<String>,
    /// Frames and lifecycle events, in transport order
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transports to the chat endpoint
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Resolves once the socket is ready for the join frame
    async fn connect(&self) -> ChatResult<Link>;
}

/// Room history provider, fetched once per open
#[async_trait]
pub trait HistorySource: Send + Sync + 'static {
    async fn history(&self, room: &RoomId) -> ChatResult<Vec<WireMessage>>;
}

/// [`Connector`] over `tokio-tungstenite`
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> ChatResult<Link> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        tracing::debug!(url = %self.url, "WebSocket opened");

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (mut sink, mut source) = stream.split();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                                break;
                            }
                        }
                        None => {
                            // Owner released the link
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    },
                    incoming = source.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if inbound_tx.send(TransportEvent::Frame(text)).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            let _ = inbound_tx.send(TransportEvent::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                    },
                }
            }
            tracing::debug!("WebSocket pump stopped");
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
