//! Wire protocol for Lockstep playback synchronization
//!
//! Both the hub and the players speak JSON text frames over a single
//! WebSocket. The hub only understands the envelope ([`ClientMessage`],
//! [`ServerMessage`]); the typed [`PlaybackEvent`] is a player-side view
//! of a relayed [`SyncPayload`].
//!
//! # Example
//!
//! ```rust
//! use lockstep_protocol::{Action, ClientMessage, PlaybackEvent};
//!
//! let event = PlaybackEvent::new(Action::Seek, 42.3).unwrap();
//! let frame = serde_json::to_string(&ClientMessage::from(event)).unwrap();
//! assert!(frame.contains("\"seek\""));
//! ```

mod event;
mod messages;

pub use event::{Action, EventError, PlaybackEvent};
pub use messages::{
    ClientMessage, ConnectedPayload, ErrorPayload, ServerMessage, SessionId, SyncPayload,
};
