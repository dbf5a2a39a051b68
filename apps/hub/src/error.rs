//! Error handling for the Lockstep hub
//!
//! HTTP-facing failures map to a status code and a small JSON body via
//! Axum's IntoResponse. Failures inside an upgraded socket never reach
//! this type; they are logged by the session loop instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Hub error type
#[derive(Error, Debug)]
pub enum HubError {
    /// Hub refused a new session (at capacity)
    #[error("service temporarily unavailable: {0}")]
    ServiceBusy(String),

    /// Catch-all for unexpected failures
    #[error("internal server error: {0}")]
    Internal(String),
}

impl HubError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceBusy(_) => "SERVICE_BUSY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log the error with severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Request rejected"
            );
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
        };

        if let Self::ServiceBusy(_) = &self {
            return (status, [("Retry-After", "5")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;

impl From<anyhow::Error> for HubError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<HubError>() {
            Ok(hub_err) => hub_err,
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}
