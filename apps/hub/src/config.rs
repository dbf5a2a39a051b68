//! Hub server configuration

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lockstep_shared_config::{get_optional_env, parse_env, CommonConfig, Environment};

/// Hub configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the player
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// Interface to bind (default: 0.0.0.0)
    pub bind_address: IpAddr,

    /// Directory mounted read-only at the media path (optional)
    pub media_dir: Option<PathBuf>,

    /// Maximum concurrent sessions, 0 for unlimited
    pub max_sessions: usize,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A configured `MEDIA_DIR` must exist and be a directory.
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env();

        let bind_address = env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse()
            .context("Invalid BIND_ADDRESS value")?;

        let media_dir = get_optional_env("MEDIA_DIR").map(PathBuf::from);
        if let Some(dir) = &media_dir {
            Self::validate_media_dir(dir)?;
        }

        Ok(Self {
            common,
            port: parse_env("PORT", 8080).context("Invalid PORT value")?,
            bind_address,
            media_dir,
            max_sessions: parse_env("MAX_SESSIONS", 0).context("Invalid MAX_SESSIONS value")?,
            cors_allowed_origins: get_optional_env("CORS_ORIGINS").map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        })
    }

    fn validate_media_dir(dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            bail!(
                "MEDIA_DIR '{}' does not exist or is not a directory",
                dir.display()
            );
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            port: 8080,
            bind_address: IpAddr::from([0, 0, 0, 0]),
            media_dir: None,
            max_sessions: 0,
            cors_allowed_origins: None,
        }
    }
}
