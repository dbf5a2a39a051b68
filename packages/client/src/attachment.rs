//! Media attachment and the readiness gate
//!
//! Playback may not be controlled until the media source is attached. The
//! attacher resolves a one-shot gate; the client defers controls until the
//! gate opens, and `start` awaits it.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

/// Timeout for the manifest request
const ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

/// Attachment state of the local media source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Pending,
    Ready,
    Failed(String),
}

impl Readiness {
    pub fn is_pending(&self) -> bool {
        matches!(self, Readiness::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Receiving side of the readiness gate; cheap to clone
#[derive(Debug, Clone)]
pub struct AttachmentGate {
    rx: watch::Receiver<Readiness>,
}

/// Resolving side of the readiness gate
///
/// Dropping an opener without resolving fails the gate.
#[derive(Debug)]
pub struct GateOpener {
    tx: watch::Sender<Readiness>,
}

impl AttachmentGate {
    pub fn channel() -> (GateOpener, AttachmentGate) {
        let (tx, rx) = watch::channel(Readiness::Pending);
        (GateOpener { tx }, AttachmentGate { rx })
    }

    /// Current state without waiting
    pub fn current(&self) -> Readiness {
        self.rx.borrow().clone()
    }

    /// Wait until the gate resolves
    pub async fn wait(&mut self) -> Readiness {
        loop {
            {
                let current = self.rx.borrow_and_update();
                if !current.is_pending() {
                    return current.clone();
                }
            }
            if self.rx.changed().await.is_err() {
                // Opener dropped; it may have resolved right before
                let last = self.rx.borrow().clone();
                return match last {
                    Readiness::Pending => {
                        Readiness::Failed("attachment abandoned".to_string())
                    }
                    resolved => resolved,
                };
            }
        }
    }
}

impl GateOpener {
    pub fn ready(self) {
        self.tx.send_replace(Readiness::Ready);
    }

    pub fn fail(self, reason: impl Into<String>) {
        self.tx.send_replace(Readiness::Failed(reason.into()));
    }
}

/// Attaches a media source by fetching its manifest
///
/// A 2xx response opens the gate; the manifest body is not interpreted.
#[derive(Debug, Clone)]
pub struct MediaAttacher {
    http_client: Client,
    manifest_url: Url,
}

impl MediaAttacher {
    pub fn new(manifest_url: Url) -> Self {
        let http_client = Client::builder()
            .timeout(ATTACH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                Client::new()
            });
        Self::with_client(manifest_url, http_client)
    }

    /// Create an attacher with a custom HTTP client (for testing)
    pub fn with_client(manifest_url: Url, http_client: Client) -> Self {
        Self {
            http_client,
            manifest_url,
        }
    }

    pub fn manifest_url(&self) -> &Url {
        &self.manifest_url
    }

    /// Fetch the manifest and report the outcome
    pub async fn attach(&self) -> Readiness {
        debug!(url = %self.manifest_url, "Attaching media source");

        match self.http_client.get(self.manifest_url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url = %self.manifest_url, "Media source attached");
                Readiness::Ready
            }
            Ok(response) => {
                let status = response.status();
                warn!(url = %self.manifest_url, status = status.as_u16(), "Manifest fetch failed");
                Readiness::Failed(format!("manifest fetch failed: {}", status))
            }
            Err(e) => {
                warn!(url = %self.manifest_url, error = %e, "Manifest fetch error");
                Readiness::Failed(format!("manifest fetch error: {}", e))
            }
        }
    }

    /// Attach and resolve `opener` with the outcome
    pub async fn run(self, opener: GateOpener) {
        match self.attach().await {
            Readiness::Ready => opener.ready(),
            Readiness::Failed(reason) => opener.fail(reason),
            Readiness::Pending => opener.fail("attachment did not resolve"),
        }
    }
}
