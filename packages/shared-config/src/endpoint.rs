//! Well-known hub routes
//!
//! Mounted by the hub; the player's default URLs point at them.

/// WebSocket relay endpoint
pub const SYNC_PATH: &str = "/sync";

/// Liveness endpoint returning a fixed `ok`
pub const HEALTH_PATH: &str = "/health";

/// Static media mount (manifests and segments)
pub const MEDIA_PATH: &str = "/media";
