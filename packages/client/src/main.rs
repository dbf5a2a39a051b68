use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lockstep_client::{ClientConfig, ClientHandle, MediaPlayer, Role, SimulatedPlayer, SyncClient};
use lockstep_shared_config::load_dotenv;

const HELP: &str = "commands: start | play | pause | seek <secs> | leader | follower | toggle | status | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockstep_client=info,lockstep_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("Invalid player configuration")?;
    let player = SimulatedPlayer::new();
    let client = SyncClient::spawn(config, player.clone());

    // Log every status transition
    let mut status = client.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            tracing::info!(status = %current, "Status changed");
        }
    });

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(e) = run_command(&client, &player, line).await {
            tracing::warn!(command = line, error = %e, "Command failed");
        }
    }

    client.shutdown();
    client.closed().await;
    Ok(())
}

async fn run_command(
    client: &ClientHandle,
    player: &SimulatedPlayer,
    line: &str,
) -> anyhow::Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        "start" => client.start().await?,
        "play" => client.play().await?,
        "pause" => client.pause().await?,
        "seek" => {
            let time: f64 = parts
                .next()
                .context("seek needs a position in seconds")?
                .parse()
                .context("seek position must be a number")?;
            client.seek(time).await?;
        }
        "leader" => {
            client.set_role(Role::Leader).await?;
        }
        "follower" => {
            client.set_role(Role::Follower).await?;
        }
        "toggle" => {
            client.toggle_role().await?;
        }
        "status" => {
            println!(
                "{} | position {:.2}s{}",
                client.status(),
                player.position(),
                if player.is_paused() { " (paused)" } else { "" }
            );
        }
        _ => println!("{}", HELP),
    }

    Ok(())
}
