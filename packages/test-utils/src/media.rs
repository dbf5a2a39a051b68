//! Mock media origin for attachment tests
//!
//! Provides a [`MockMediaServer`] that answers stream manifest requests the
//! way a static HLS origin would, or fails them on demand.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal HLS manifest returned by [`MockMediaServer::mock_manifest`]
pub const SAMPLE_MANIFEST: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXTINF:10.0,\n\
segment0.ts\n\
#EXT-X-ENDLIST\n";

const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Mock media origin
///
/// Wraps a [`wiremock::MockServer`]; manifests live at
/// `/media/<name>/index.m3u8`.
pub struct MockMediaServer {
    server: MockServer,
}

impl MockMediaServer {
    /// Start a new mock media origin
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// URL of the manifest for `name`
    pub fn manifest_url(&self, name: &str) -> String {
        format!("{}{}", self.server.uri(), manifest_path(name))
    }

    /// Serve a valid manifest for `name`
    pub async fn mock_manifest(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(manifest_path(name)))
            .respond_with(manifest_response())
            .mount(&self.server)
            .await;
    }

    /// Serve a valid manifest for `name` after `delay_ms`
    pub async fn mock_manifest_delayed(&self, name: &str, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(manifest_path(name)))
            .respond_with(manifest_response().set_delay(Duration::from_millis(delay_ms)))
            .mount(&self.server)
            .await;
    }

    /// Answer the manifest for `name` with 404
    pub async fn mock_manifest_missing(&self, name: &str) {
        self.mock_manifest_failure(name, 404).await;
    }

    /// Answer the manifest for `name` with an arbitrary status
    pub async fn mock_manifest_failure(&self, name: &str, status_code: u16) {
        Mock::given(method("GET"))
            .and(path(manifest_path(name)))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the origin has received so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Get reference to the underlying mock server for custom mock setups
    pub fn inner(&self) -> &MockServer {
        &self.server
    }
}

fn manifest_path(name: &str) -> String {
    format!("/media/{}/index.m3u8", name)
}

fn manifest_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", MANIFEST_CONTENT_TYPE)
        .set_body_string(SAMPLE_MANIFEST)
}
