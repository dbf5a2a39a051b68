//! HTTP route handlers for the Lockstep hub
//!
//! - Health check and liveness endpoints
//! - Read-only media mount for manifests and segments

pub mod health;
pub mod media;

pub use health::{health_router, HealthState};
pub use media::media_service;
