//! Error types for the Lockstep client

use lockstep_protocol::EventError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors returned to callers of the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// No active link to the hub; emission is not queued
    #[error("Not connected to the hub")]
    NotConnected,

    /// The link closed while the event was being handed to it
    #[error("Link to the hub closed")]
    LinkClosed,

    /// Outbound queue is full
    #[error("Outbound queue is full, event dropped")]
    Backpressure,

    /// Media source could not be attached
    #[error("Media attachment failed: {0}")]
    Attachment(String),

    /// Event rejected before sending
    #[error("Invalid playback event: {0}")]
    InvalidEvent(#[from] EventError),

    /// WebSocket transport failure
    #[error("Transport error: {0}")]
    Transport(#[source] Box<tungstenite::Error>),

    /// Failed to serialize/deserialize JSON
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hub or media URL could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The client event loop has exited
    #[error("Client has stopped")]
    ClientStopped,
}

impl ClientError {
    /// Check if this error is transient and the call may succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NotConnected
                | ClientError::LinkClosed
                | ClientError::Backpressure
                | ClientError::Transport(_)
        )
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        ClientError::Transport(Box::new(err))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_are_retryable() {
        assert!(ClientError::NotConnected.is_retryable());
        assert!(ClientError::LinkClosed.is_retryable());
        assert!(ClientError::Backpressure.is_retryable());
        assert!(ClientError::from(tungstenite::Error::ConnectionClosed).is_retryable());
    }

    #[test]
    fn test_caller_errors_are_not_retryable() {
        assert!(!ClientError::Attachment("404".into()).is_retryable());
        assert!(!ClientError::InvalidEvent(EventError::InvalidTime(-1.0)).is_retryable());
        assert!(!ClientError::ClientStopped.is_retryable());
    }
}
