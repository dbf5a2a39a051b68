//! Integration tests for health check and media endpoints
//!
//! Drives the full hub router in-process with `oneshot`.

use axum::{body::Body, http::Request, http::StatusCode, Router};
use tokio::sync::mpsc;
use tower::ServiceExt;

use lockstep_hub::{build_router, Config, SessionRegistry};

fn create_test_app(registry: SessionRegistry) -> Router {
    build_router(&Config::default(), registry)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_root_endpoint() {
    let (status, body) = get(create_test_app(SessionRegistry::new()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Lockstep"));
}

#[tokio::test]
async fn test_simple_health_check() {
    let (status, body) = get(create_test_app(SessionRegistry::new()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_liveness_probe() {
    let (status, body) = get(create_test_app(SessionRegistry::new()), "/health/live").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "alive");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_reports_session_count() {
    let registry = SessionRegistry::new();
    let (tx1, _rx1) = mpsc::channel(1);
    let (tx2, _rx2) = mpsc::channel(1);
    registry.connect(tx1);
    registry.connect(tx2);

    let (status, body) = get(create_test_app(registry), "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["sessions"], 2);
}

#[tokio::test]
async fn test_media_mount_serves_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("movie1")).unwrap();
    std::fs::write(dir.path().join("movie1/index.m3u8"), "#EXTM3U\n").unwrap();

    let config = Config {
        media_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let app = build_router(&config, SessionRegistry::new());

    let (status, body) = get(app, "/media/movie1/index.m3u8").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"#EXTM3U\n");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = get(create_test_app(SessionRegistry::new()), "/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
