//! Configuration error types

use thiserror::Error;

/// Errors raised while reading Lockstep configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("invalid URL for {name}: {source}")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },

    /// URL parsed but uses a scheme the consumer cannot speak
    #[error("{name} must use one of [{expected}], got '{scheme}'")]
    UnsupportedScheme {
        name: String,
        scheme: String,
        expected: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
