//! WebSocket session registry
//!
//! Tracks every connected player session and fans relayed messages out to
//! all of them except the originator.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lockstep_protocol::{ServerMessage, SessionId};

/// Outbound queue depth per session
///
/// A peer that falls this far behind starts losing relayed events instead
/// of slowing the broadcaster down.
pub const SESSION_CHANNEL_CAPACITY: usize = 256;

/// How often the pruner sweeps sessions whose writer has exited
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(30);

/// A registered session as handed back to the socket task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// Unix timestamp (ms) at which the session was registered
    pub connected_at: i64,
}

/// Handle for sending messages to a specific session
#[derive(Debug)]
pub struct SessionHandle {
    /// Bounded queue drained by the session's writer task
    pub sender: mpsc::Sender<ServerMessage>,

    /// When this session was established (Unix timestamp ms)
    pub connected_at: i64,
}

impl SessionHandle {
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            sender,
            connected_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Queue a message without waiting for room
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ConnectionClosed,
        })
    }

    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Outcome of a single fan-out, for logging only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers whose queue accepted the message
    pub delivered: usize,
    /// Peers skipped because their queue was full or closed
    pub dropped: usize,
}

/// Set of currently connected sessions
///
/// Uses DashMap so sessions can join and leave while broadcasts from
/// other sessions are iterating. Wrapped in Arc for cheap cloning.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Register a new session whose outbound messages go to `sender`
    pub fn connect(&self, sender: mpsc::Sender<ServerMessage>) -> Session {
        let id = SessionId::new();
        let handle = SessionHandle::new(sender);
        let session = Session {
            id,
            connected_at: handle.connected_at,
        };

        self.sessions.insert(id, handle);

        tracing::debug!(
            session_id = %id,
            session_count = self.sessions.len(),
            "Session connected"
        );

        session
    }

    /// Register a session unless that would exceed `max_sessions` (0 = unlimited)
    ///
    /// The session is inserted first and backed out if the map grew past the
    /// limit, so concurrent upgrades can never overshoot it.
    pub fn connect_bounded(
        &self,
        sender: mpsc::Sender<ServerMessage>,
        max_sessions: usize,
    ) -> Option<Session> {
        let session = self.connect(sender);
        if max_sessions > 0 && self.sessions.len() > max_sessions {
            self.disconnect(&session.id);
            return None;
        }
        Some(session)
    }

    /// Remove a session
    ///
    /// Dropping the handle closes the session's outbound queue, which ends
    /// its writer task and therefore the socket.
    pub fn disconnect(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.remove(session_id).is_some();

        if removed {
            tracing::debug!(
                session_id = %session_id,
                session_count = self.sessions.len(),
                "Session disconnected"
            );
        }

        removed
    }

    /// Drop every session, closing all sockets
    pub fn disconnect_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    pub fn is_connected(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    /// Send a message to one session
    pub fn send_to(&self, session_id: &SessionId, msg: ServerMessage) -> Result<(), SendError> {
        let handle = self
            .sessions
            .get(session_id)
            .ok_or(SendError::SessionNotFound)?;

        handle.try_send(msg)
    }

    /// Send a message to every session except `from`
    ///
    /// Never waits on a peer: a full or closed queue only costs that peer
    /// this message. Nothing about the outcome is remembered.
    pub fn broadcast(&self, from: &SessionId, msg: ServerMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for entry in self.sessions.iter() {
            if entry.key() == from {
                continue;
            }

            match entry.value().try_send(msg.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.dropped += 1;
                    tracing::warn!(
                        from = %from,
                        to = %entry.key(),
                        error = %e,
                        "Dropped relayed message for peer"
                    );
                }
            }
        }

        report
    }

    /// Remove sessions whose writer has already gone away
    pub fn prune_closed(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|session_id, handle| {
            let alive = handle.is_alive();
            if !alive {
                tracing::debug!(session_id = %session_id, "Removed closed session");
            }
            alive
        });
        before - self.sessions.len()
    }

    /// Sweep closed sessions every `period` until `shutdown` is cancelled
    pub async fn run_pruner(self, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = self.prune_closed();
                    if removed > 0 {
                        tracing::info!(
                            removed,
                            sessions = self.session_count(),
                            "Pruned closed sessions"
                        );
                    }
                }
            }
        }
    }
}

/// Error type for send operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session queue full")]
    QueueFull,

    #[error("connection closed")]
    ConnectionClosed,
}
