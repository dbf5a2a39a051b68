//! WebSocket upgrade handler for the relay endpoint
//!
//! Each upgraded socket becomes one session: a writer task drains the
//! session's outbound queue, a reader task feeds frames to the relay.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;

use lockstep_protocol::{ConnectedPayload, ServerMessage};

use super::connection::{SessionRegistry, SESSION_CHANNEL_CAPACITY};
use super::relay::RelayHandler;
use crate::error::{HubError, HubResult};

/// Shared state for the relay endpoint
#[derive(Clone)]
pub struct SyncState {
    pub registry: SessionRegistry,
    /// Upper bound on concurrent sessions (0 = unlimited)
    pub max_sessions: usize,
}

impl SyncState {
    pub fn new(registry: SessionRegistry, max_sessions: usize) -> Self {
        Self {
            registry,
            max_sessions,
        }
    }

    fn at_capacity(&self) -> bool {
        self.max_sessions > 0 && self.registry.session_count() >= self.max_sessions
    }
}

/// Create the relay router (mounted at the sync path)
pub fn sync_router(state: SyncState) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SyncState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> HubResult<Response> {
    if state.at_capacity() {
        tracing::warn!(
            max_sessions = state.max_sessions,
            "Rejecting WebSocket upgrade, hub at capacity"
        );
        return Err(HubError::ServiceBusy(format!(
            "hub is limited to {} sessions",
            state.max_sessions
        )));
    }

    let peer = connect_info.map(|ConnectInfo(addr)| addr.to_string());

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state.registry, state.max_sessions, peer)
    }))
}

/// Handle an established WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    registry: SessionRegistry,
    max_sessions: usize,
    peer: Option<String>,
) {
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(SESSION_CHANNEL_CAPACITY);

    // Upgrades racing past the pre-upgrade check are turned away here
    let Some(session) = registry.connect_bounded(tx, max_sessions) else {
        tracing::warn!(max_sessions, "Closing upgraded socket, hub at capacity");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AGAIN,
                reason: "hub at capacity".into(),
            })))
            .await;
        return;
    };
    let session_id = session.id;

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connected_msg = ServerMessage::Connected(ConnectedPayload {
        session_id,
        connected_at: session.connected_at,
    });

    match serde_json::to_string(&connected_msg) {
        Ok(json) => {
            if ws_sender.send(Message::Text(json)).await.is_err() {
                tracing::warn!(session_id = %session_id, "Failed to send connected message");
                registry.disconnect(&session_id);
                return;
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize connected message");
        }
    }

    tracing::info!(
        session_id = %session_id,
        peer = peer.as_deref().unwrap_or("unknown"),
        sessions = registry.session_count(),
        "Session opened"
    );

    // Forward queued messages to the socket; ends when the registry drops
    // this session's sender
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        tracing::debug!(session_id = %session_id, "WebSocket send failed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    let relay = RelayHandler::new(session_id, registry.clone());
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Err(e) = relay.handle_text(&text) {
                        tracing::debug!(
                            error = %e,
                            session_id = %relay.session_id(),
                            "Failed to handle client frame"
                        );
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = %relay.session_id(), "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pings are answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(session_id = %relay.session_id(), "WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, session_id = %relay.session_id(), "WebSocket error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete, then abort the other
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(session_id = %session_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!(session_id = %session_id, "Receive task completed");
            send_task.abort();
        }
    }

    registry.disconnect(&session_id);

    tracing::info!(
        session_id = %session_id,
        sessions = registry.session_count(),
        "Session closed"
    );
}
