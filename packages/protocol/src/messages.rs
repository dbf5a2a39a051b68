//! WebSocket message types exchanged between players and the hub
//!
//! Messages are serialized as JSON with an adjacent `type`/`payload` tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Client -> Hub Messages
// =============================================================================

/// Messages sent from a player to the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Relay a playback intent to every other connected player
    PlaybackEvent(SyncPayload),
}

// =============================================================================
// Hub -> Client Messages
// =============================================================================

/// Messages sent from the hub to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Session registered with the hub
    Connected(ConnectedPayload),

    /// Playback intent relayed from another session
    Sync(SyncPayload),

    /// The last frame could not be handled
    Error(ErrorPayload),
}

// =============================================================================
// Payload Types
// =============================================================================

/// Opaque session handle assigned by the hub
///
/// Carries no durable identity: a reconnecting player gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Action/time pair as it travels over the wire
///
/// `action` is kept as a raw string: the hub relays it verbatim and
/// receivers decide whether they understand it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub action: String,
    /// Playback position in seconds
    pub time: f64,
}

impl SyncPayload {
    pub fn new(action: impl Into<String>, time: f64) -> Self {
        Self {
            action: action.into(),
            time,
        }
    }
}

/// Payload for Connected message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub session_id: SessionId,
    /// Unix timestamp (ms) at which the hub registered the session
    pub connected_at: i64,
}

/// Payload for Error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::new("INVALID_MESSAGE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
