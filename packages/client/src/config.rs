//! Player configuration

use std::time::Duration;

use lockstep_shared_config::{
    parse_env, parse_url_env, CommonConfig, ConfigError, ConfigResult,
};
use url::Url;

use crate::connection::ReconnectPolicy;
use crate::error::{ClientError, ClientResult};
use crate::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::role::Role;

pub const DEFAULT_HUB_URL: &str = "ws://localhost:8080/sync";
pub const DEFAULT_MEDIA_URL: &str = "http://localhost:8080/media/movie1/index.m3u8";

/// Configuration for one player client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub common: CommonConfig,

    /// Hub relay endpoint (ws:// or wss://)
    pub hub_url: Url,

    /// Stream manifest to attach before playback
    pub media_url: Url,

    /// Role at startup
    pub role: Role,

    /// Leader heartbeat period
    pub heartbeat_interval: Duration,

    /// Delays between reconnect attempts (not read from the environment)
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Config for the given URLs with every other setting at its default
    pub fn new(hub_url: &str, media_url: &str) -> ClientResult<Self> {
        Ok(Self {
            common: CommonConfig::default(),
            hub_url: parse(hub_url)?,
            media_url: parse(media_url)?,
            role: Role::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect: ReconnectPolicy::default(),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let heartbeat_ms: u64 = parse_env(
            "LOCKSTEP_HEARTBEAT_MS",
            DEFAULT_HEARTBEAT_INTERVAL.as_millis() as u64,
        )?;
        if heartbeat_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "LOCKSTEP_HEARTBEAT_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            common: CommonConfig::from_env(),
            hub_url: parse_url_env("LOCKSTEP_HUB_URL", DEFAULT_HUB_URL, &["ws", "wss"])?,
            media_url: parse_url_env(
                "LOCKSTEP_MEDIA_URL",
                DEFAULT_MEDIA_URL,
                &["http", "https"],
            )?,
            role: parse_env("LOCKSTEP_ROLE", Role::default())?,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
            reconnect: ReconnectPolicy::default(),
        })
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

fn parse(raw: &str) -> ClientResult<Url> {
    Url::parse(raw).map_err(|source| ClientError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests that modify environment variables don't run in parallel
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const CLIENT_VARS: &[&str] = &[
        "LOCKSTEP_HUB_URL",
        "LOCKSTEP_MEDIA_URL",
        "LOCKSTEP_ROLE",
        "LOCKSTEP_HEARTBEAT_MS",
    ];

    /// Sets variables for one test and restores the previous values on drop
    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let guard = Self::clear(CLIENT_VARS);
            for (k, v) in vars {
                env::set_var(k, v);
            }
            guard
        }

        fn clear(vars: &[&str]) -> Self {
            let saved = vars
                .iter()
                .map(|k| {
                    let old = env::var(k).ok();
                    env::remove_var(k);
                    (k.to_string(), old)
                })
                .collect();
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (k, v) in &self.saved {
                match v {
                    Some(val) => env::set_var(k, val),
                    None => env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::clear(CLIENT_VARS);

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.hub_url.as_str(), DEFAULT_HUB_URL);
        assert_eq!(config.media_url.as_str(), DEFAULT_MEDIA_URL);
        assert_eq!(config.role, Role::Follower);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(3000));
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::set(&[
            ("LOCKSTEP_HUB_URL", "wss://hub.example.com/sync"),
            ("LOCKSTEP_ROLE", "Leader"),
            ("LOCKSTEP_HEARTBEAT_MS", "500"),
        ]);

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.hub_url.host_str(), Some("hub.example.com"));
        assert_eq!(config.role, Role::Leader);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_rejects_http_hub_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::set(&[("LOCKSTEP_HUB_URL", "http://localhost:8080/sync")]);

        assert_matches!(
            ClientConfig::from_env(),
            Err(ConfigError::UnsupportedScheme { .. })
        );
    }

    #[test]
    fn test_rejects_bad_role_and_zero_heartbeat() {
        let _lock = ENV_MUTEX.lock().unwrap();
        {
            let _guard = EnvGuard::set(&[("LOCKSTEP_ROLE", "observer")]);
            assert_matches!(ClientConfig::from_env(), Err(ConfigError::InvalidValue { .. }));
        }
        {
            let _guard = EnvGuard::set(&[("LOCKSTEP_HEARTBEAT_MS", "0")]);
            assert_matches!(ClientConfig::from_env(), Err(ConfigError::InvalidValue { .. }));
        }
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert_matches!(
            ClientConfig::new("not a url", DEFAULT_MEDIA_URL),
            Err(ClientError::InvalidUrl { .. })
        );
    }
}
