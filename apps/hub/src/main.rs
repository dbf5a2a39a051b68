use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lockstep_hub::{build_router, serve, Config, SessionRegistry};
use lockstep_shared_config::{load_dotenv, SYNC_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before the filter reads RUST_LOG
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockstep_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        environment = %config.environment(),
        max_sessions = config.max_sessions,
        "Starting Lockstep hub on port {}",
        config.port
    );

    let registry = SessionRegistry::new();
    let app = build_router(&config, registry.clone());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("Players connect to ws://{}{}", addr, SYNC_PATH);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Received Ctrl-C");
        signal.cancel();
    });

    serve(listener, app, registry, shutdown).await?;

    tracing::info!("Hub stopped");
    Ok(())
}
