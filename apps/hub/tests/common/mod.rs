//! Common test utilities for hub integration tests
//!
//! Runs a real hub on an ephemeral port so tests can connect over TCP.

#![allow(dead_code)]

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lockstep_hub::{build_router, serve, Config, SessionRegistry};

/// A hub running in the background for the duration of a test
pub struct TestHub {
    pub addr: SocketAddr,
    pub registry: SessionRegistry,
    shutdown: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestHub {
    /// Start a hub with default configuration
    pub async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    /// Start a hub with `config`; the configured port is ignored
    pub async fn start_with(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let registry = SessionRegistry::new();
        let app = build_router(&config, registry.clone());
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(serve(
            listener,
            app,
            registry.clone(),
            shutdown.clone(),
        ));

        Self {
            addr,
            registry,
            shutdown,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/sync", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the registry holds `count` sessions
    pub async fn wait_for_sessions(&self, count: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while self.registry.session_count() != count {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} sessions, have {}",
                count,
                self.registry.session_count()
            )
        });
    }

    /// Cancel the hub and wait for the server task to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), self.handle).await;
    }
}
