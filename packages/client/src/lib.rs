//! Lockstep player client
//!
//! Keeps a local media player in approximate lock-step with other players
//! through the relay hub. Each client picks a role locally:
//!
//! - A **leader** emits its own play, pause and seek controls plus a
//!   heartbeat with its position every few seconds.
//! - A **follower** applies relayed controls immediately and snaps to the
//!   leader's heartbeat position when it drifts more than
//!   [`DRIFT_THRESHOLD_SECS`].
//!
//! Relayed play, pause and seek are applied in either role. Controls issued
//! before the media source is attached wait for attachment. Emission while
//! the hub link is down fails with [`ClientError::NotConnected`] and the link
//! is re-established automatically.
//!
//! # Example
//!
//! ```no_run
//! use lockstep_client::{ClientConfig, Role, SimulatedPlayer, SyncClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(
//!     "ws://localhost:8080/sync",
//!     "http://localhost:8080/media/movie1/index.m3u8",
//! )?
//! .with_role(Role::Leader);
//!
//! let client = SyncClient::spawn(config, SimulatedPlayer::new());
//! client.start().await?;
//! client.seek(42.3).await?;
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod client;
pub mod config;
pub mod connection;
mod context;
pub mod drift;
pub mod error;
pub mod heartbeat;
pub mod player;
pub mod role;
pub mod status;

pub use attachment::{AttachmentGate, GateOpener, MediaAttacher, Readiness};
pub use client::{ClientHandle, SyncClient};
pub use config::ClientConfig;
pub use connection::{LinkState, ReconnectPolicy};
pub use drift::{Correction, DriftCorrector, DRIFT_THRESHOLD_SECS};
pub use error::{ClientError, ClientResult};
pub use heartbeat::{HeartbeatTimer, DEFAULT_HEARTBEAT_INTERVAL};
pub use player::{MediaPlayer, SimulatedPlayer};
pub use role::{ParseRoleError, Role, RoleState, RoleTransition};
pub use status::Status;
