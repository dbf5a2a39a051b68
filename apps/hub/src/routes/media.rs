//! Read-only media mount
//!
//! Serves manifests and segments from a directory so players have
//! something to attach. The hub never looks inside these files.

use std::path::Path;

use tower_http::services::ServeDir;

/// Build the static file service for `dir`
pub fn media_service(dir: &Path) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(false)
}
