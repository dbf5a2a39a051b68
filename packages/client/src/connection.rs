//! Link to the hub
//!
//! A link is one WebSocket connection: a writer task drains a bounded
//! outbound queue while the event loop reads inbound frames. When a link is
//! lost the event loop dials again following a [`ReconnectPolicy`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::stream::{SplitStream, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use lockstep_protocol::{ClientMessage, ServerMessage, SessionId};

use crate::error::{ClientError, ClientResult};

/// Capacity of the per-link outbound queue
pub const LINK_QUEUE_CAPACITY: usize = 64;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pending connection attempt, including its backoff delay
pub(crate) type Dial = Pin<Box<dyn Future<Output = ClientResult<WsStream>> + Send>>;

/// Delays between reconnect attempts
///
/// Attempt `n` waits `delays[n]`; attempts past the end of the list wait
/// `steady` forever. The default mirrors the common automatic-reconnect
/// schedule of 0, 2, 10 and 30 seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    delays: Vec<Duration>,
    steady: Duration,
}

impl ReconnectPolicy {
    pub fn new(delays: Vec<Duration>, steady: Duration) -> Self {
        Self { delays, steady }
    }

    /// Same delay before every attempt
    pub fn fixed(delay: Duration) -> Self {
        Self::new(Vec::new(), delay)
    }

    /// Delay before zero-based attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delays
            .get(attempt as usize)
            .copied()
            .unwrap_or(self.steady)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(10),
                Duration::from_secs(30),
            ],
            Duration::from_secs(30),
        )
    }
}

/// Transport state as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// First connection attempt in flight
    Connecting,
    /// Hub has acknowledged the session
    Connected { session_id: SessionId },
    /// Link lost or refused; `attempt` numbers the dial in flight
    Reconnecting { attempt: u32 },
    /// Client stopped
    Disconnected,
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected { .. })
    }
}

/// Connect to `url` after waiting `delay`
pub(crate) fn dial(url: Url, delay: Duration) -> Dial {
    Box::pin(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!(url = %url, "Dialing hub");
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(stream)
    })
}

/// What the reader saw next
#[derive(Debug)]
pub(crate) enum Inbound {
    Message(ServerMessage),
    Closed,
}

/// Sending half of a link; handed to the client context
#[derive(Debug, Clone)]
pub(crate) struct Outbound {
    tx: mpsc::Sender<ClientMessage>,
}

impl Outbound {
    pub(crate) fn new(tx: mpsc::Sender<ClientMessage>) -> Self {
        Self { tx }
    }

    /// Queue `msg` without waiting
    pub(crate) fn send(&self, msg: ClientMessage) -> ClientResult<()> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ClientError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => ClientError::LinkClosed,
        })
    }
}

/// Receiving half of a link; read by the event loop
pub(crate) struct Inbox {
    incoming: SplitStream<WsStream>,
}

impl Inbox {
    /// Next server message, skipping control frames and unparseable text
    pub(crate) async fn recv(&mut self) -> Inbound {
        while let Some(frame) = self.incoming.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => return Inbound::Message(msg),
                    Err(e) => debug!(error = %e, "Ignoring unparseable hub frame"),
                },
                Ok(Message::Close(_)) => return Inbound::Closed,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "Hub read failed");
                    return Inbound::Closed;
                }
            }
        }
        Inbound::Closed
    }
}

/// Split `stream` into a link and spawn its writer task
///
/// The writer ends, closing the socket, once every [`Outbound`] is dropped.
pub(crate) fn open_link(stream: WsStream) -> (Outbound, Inbox) {
    let (mut sink, incoming) = stream.split();
    let (tx, mut rx) = mpsc::channel::<ClientMessage>(LINK_QUEUE_CAPACITY);

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json)).await {
                debug!(error = %e, "Hub write failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    (Outbound::new(tx), Inbox { incoming })
}

/// Wait on an optional dial; never completes when there is none
pub(crate) async fn poll_dial(dialing: &mut Option<Dial>) -> ClientResult<WsStream> {
    match dialing {
        Some(dial) => dial.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Read from an optional inbox; never completes when there is none
pub(crate) async fn next_inbound(inbox: &mut Option<Inbox>) -> Inbound {
    match inbox {
        Some(inbox) => inbox.recv().await,
        None => std::future::pending().await,
    }
}
