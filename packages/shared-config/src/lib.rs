//! Shared configuration types for Lockstep services
//!
//! Common configuration used by both the hub and the player, plus the
//! environment helpers each service builds its own config from.

mod endpoint;
mod error;

pub use endpoint::{HEALTH_PATH, MEDIA_PATH, SYNC_PATH};
pub use error::{ConfigError, ConfigResult};

use std::env;

use url::Url;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Environment mode (development, staging, production)
    pub environment: Environment,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            environment: get_env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: "info".to_string(),
        }
    }
}

/// Load a `.env` file from the working directory if one exists
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Get an optional environment variable, treating empty values as unset
pub fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.trim().parse().map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL and check that it uses one of the allowed schemes
pub fn parse_url(name: &str, raw: &str, schemes: &[&str]) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        name: name.to_string(),
        source,
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            name: name.to_string(),
            scheme: url.scheme().to_string(),
            expected: schemes.join(", "),
        });
    }

    Ok(url)
}

/// Read a URL environment variable, falling back to `default`
pub fn parse_url_env(name: &str, default: &str, schemes: &[&str]) -> ConfigResult<Url> {
    let raw = get_env_or_default(name, default);
    parse_url(name, &raw, schemes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "stage".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "anything".parse::<Environment>().unwrap(),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(format!("{}", Environment::Production), "production");
        assert_eq!(format!("{}", Environment::Development), "development");
    }

    #[test]
    fn test_parse_url_accepts_allowed_scheme() {
        let url = parse_url("HUB", "ws://localhost:8080/sync", &["ws", "wss"]).unwrap();
        assert_eq!(url.path(), "/sync");
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_parse_url_rejects_other_scheme() {
        let err = parse_url("HUB", "http://localhost/sync", &["ws", "wss"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { ref scheme, .. } if scheme == "http"));
        assert!(err.to_string().contains("ws, wss"));
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = parse_url("MEDIA", "not a url", &["http"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("LOCKSTEP_TEST_SURELY_UNSET_VAR", 8080).unwrap();
        assert_eq!(value, 8080);
    }
}
