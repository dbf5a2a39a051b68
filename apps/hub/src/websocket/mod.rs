//! WebSocket relay for playback synchronization
//!
//! This module handles:
//! - Session registration and teardown
//! - Fan-out of playback events to every session but the sender
//! - Periodic removal of sessions whose socket has gone away

pub mod connection;
pub mod handler;
pub mod relay;

pub use connection::{
    BroadcastReport, Session, SessionRegistry, PRUNE_INTERVAL, SESSION_CHANNEL_CAPACITY,
};
pub use handler::{sync_router, SyncState};
pub use relay::{RelayError, RelayHandler};
