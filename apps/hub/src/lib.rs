//! Lockstep hub library
//!
//! The hub accepts WebSocket sessions from players and relays each
//! playback event to every other connected session. It keeps no playback
//! state of its own. The router and server entry points live here so
//! integration tests can run a real hub on an ephemeral port.

pub mod config;
pub mod error;
pub mod routes;
pub mod websocket;

use std::net::SocketAddr;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use lockstep_shared_config::{HEALTH_PATH, MEDIA_PATH, SYNC_PATH};

pub use config::Config;
pub use error::{ErrorResponse, HubError, HubResult};
pub use websocket::SessionRegistry;

use routes::{health_router, media_service, HealthState};
use websocket::{sync_router, SyncState};

/// Build the CORS layer based on configuration.
///
/// Configured origins are always honored. Without `CORS_ORIGINS`, production
/// rejects cross-origin requests and development allows any origin.
fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                return CorsLayer::new();
            }

            tracing::info!(
                "CORS configured with {} allowed origin(s)",
                allowed_origins.len()
            );
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::RANGE])
                .max_age(std::time::Duration::from_secs(3600))
        }
        _ if config.is_production() => {
            tracing::warn!("CORS_ORIGINS not configured in production mode, CORS requests will be rejected");
            CorsLayer::new()
        }
        _ => CorsLayer::permissive(),
    }
}

/// Build the hub router
///
/// - `/sync` - WebSocket relay endpoint
/// - `/health`, `/health/live`, `/health/ready` - probes
/// - `/media/*` - static media mount, only when `MEDIA_DIR` is configured
pub fn build_router(config: &Config, registry: SessionRegistry) -> Router {
    let sync_state = SyncState::new(registry.clone(), config.max_sessions);
    let health_state = HealthState::new(registry);

    let mut app = Router::new()
        .route("/", get(root))
        .nest(SYNC_PATH, sync_router(sync_state))
        .nest(HEALTH_PATH, health_router(health_state));

    if let Some(dir) = &config.media_dir {
        tracing::info!(media_dir = %dir.display(), "Serving media at {}", MEDIA_PATH);
        app = app.nest_service(MEDIA_PATH, media_service(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

/// Serve `app` on `listener` until `shutdown` is cancelled
///
/// On shutdown every session is dropped from the registry, which closes
/// their sockets, before the listener stops accepting.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    registry: SessionRegistry,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    tokio::spawn(
        registry
            .clone()
            .run_pruner(websocket::PRUNE_INTERVAL, shutdown.clone()),
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.cancelled().await;
        let closed = registry.disconnect_all();
        tracing::info!(sessions = closed, "Hub shutting down");
    })
    .await
}

async fn root() -> &'static str {
    "Lockstep hub"
}
