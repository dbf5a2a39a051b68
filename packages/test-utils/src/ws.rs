//! Raw protocol peer for hub tests
//!
//! [`WsTestClient`] speaks the wire protocol directly, without any of the
//! player's role or drift logic, so tests can assert exactly what the hub
//! relays. Helpers panic on protocol violations; they are test-only.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use lockstep_protocol::{
    ClientMessage, ConnectedPayload, ServerMessage, SessionId, SyncPayload,
};

/// How long `recv` helpers wait before giving up
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket peer speaking the raw relay protocol
pub struct WsTestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    session_id: Option<SessionId>,
}

impl WsTestClient {
    /// Connect to `url`, panicking if the handshake fails
    pub async fn connect(url: &str) -> Self {
        match Self::try_connect(url).await {
            Ok(client) => client,
            Err(e) => panic!("failed to connect to {}: {}", url, e),
        }
    }

    /// Connect to `url`, returning the handshake error
    pub async fn try_connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (stream, _response) = connect_async(url).await?;
        Ok(Self {
            stream,
            session_id: None,
        })
    }

    /// Connect and consume the `connected` greeting
    pub async fn connect_ready(url: &str) -> Self {
        let mut client = Self::connect(url).await;
        client.expect_connected().await;
        client
    }

    /// Session id assigned by the hub, once the greeting has been read
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Read the next frame and assert it is the `connected` greeting
    pub async fn expect_connected(&mut self) -> ConnectedPayload {
        match self.recv().await {
            Some(ServerMessage::Connected(payload)) => {
                self.session_id = Some(payload.session_id);
                payload
            }
            other => panic!("expected connected message, got {:?}", other),
        }
    }

    /// Send a playback event
    pub async fn send_event(&mut self, action: &str, time: f64) {
        let msg = ClientMessage::PlaybackEvent(SyncPayload::new(action, time));
        let json = serde_json::to_string(&msg).expect("client message serializes");
        self.send_raw(&json).await;
    }

    /// Send an arbitrary text frame
    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .expect("send text frame");
    }

    /// Next server message, or `None` on timeout or close
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.recv_within(DEFAULT_RECV_TIMEOUT).await
    }

    /// Next server message within `timeout`
    ///
    /// Control frames are skipped. Unparseable text frames panic.
    pub async fn recv_within(&mut self, timeout: Duration) -> Option<ServerMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .ok()??;
            match frame {
                Ok(Message::Text(text)) => {
                    let msg = serde_json::from_str(&text)
                        .unwrap_or_else(|e| panic!("invalid server frame {:?}: {}", text, e));
                    return Some(msg);
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Read the next frame and assert it is a relayed `sync`
    pub async fn recv_sync(&mut self) -> SyncPayload {
        match self.recv().await {
            Some(ServerMessage::Sync(payload)) => payload,
            other => panic!("expected sync message, got {:?}", other),
        }
    }

    /// Assert that nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Some(msg) = self.recv_within(window).await {
            panic!("expected no message, got {:?}", msg);
        }
    }

    /// Whether the hub has closed this socket within `timeout`
    pub async fn closed_within(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Close the socket
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
