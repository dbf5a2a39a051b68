//! Shared test utilities for the Lockstep workspace
//!
//! This crate provides stand-ins for the pieces a player talks to, so the
//! hub and client suites can run without real media or a hand-driven peer.
//!
//! # Test Doubles
//!
//! - [`MockMediaServer`] - Mock media origin serving (or refusing) stream manifests
//! - [`WsTestClient`] - Raw protocol peer for driving a hub over WebSocket
//!
//! # Example
//!
//! ```rust,ignore
//! use lockstep_test_utils::{MockMediaServer, WsTestClient};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let media = MockMediaServer::start().await;
//!     media.mock_manifest("movie1").await;
//!
//!     let mut peer = WsTestClient::connect("ws://127.0.0.1:8080/sync").await;
//!     peer.expect_connected().await;
//! }
//! ```

mod media;
mod ws;

pub use media::{MockMediaServer, SAMPLE_MANIFEST};
pub use ws::{WsTestClient, DEFAULT_RECV_TIMEOUT};
