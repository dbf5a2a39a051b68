//! Reconnect backoff against hubs that drop the link right away

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use lockstep_client::{ClientConfig, LinkState, SimulatedPlayer, SyncClient};
use lockstep_protocol::{ConnectedPayload, ServerMessage, SessionId};
use lockstep_test_utils::MockMediaServer;

/// Minimal hub stand-in that closes every socket it accepts
///
/// With `greet` set it first sends the `Connected` greeting and holds the
/// socket briefly, like a hub that later drops the session.
async fn start_closing_hub(greet: bool) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/sync", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            if greet {
                let greeting = ServerMessage::Connected(ConnectedPayload {
                    session_id: SessionId::new(),
                    connected_at: 0,
                });
                let json = serde_json::to_string(&greeting).unwrap();
                let _ = ws.send(Message::Text(json)).await;
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            let _ = ws.close(None).await;
        }
    });

    (url, accepted)
}

async fn media() -> MockMediaServer {
    let media = MockMediaServer::start().await;
    media.mock_manifest("movie1").await;
    media
}

#[test_log::test(tokio::test)]
async fn test_link_closed_before_greeting_keeps_backing_off() {
    let media = media().await;
    let (hub_url, accepted) = start_closing_hub(false).await;

    // Default schedule: 0 s, then 2 s, then 10 s
    let config = ClientConfig::new(&hub_url, &media.manifest_url("movie1")).unwrap();
    let client = SyncClient::spawn(config, SimulatedPlayer::new());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(client.status().link, LinkState::Reconnecting { attempt: 2 });

    tokio::time::sleep(Duration::from_millis(1800)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    assert_eq!(client.status().link, LinkState::Reconnecting { attempt: 3 });

    client.shutdown();
    client.closed().await;
}

#[test_log::test(tokio::test)]
async fn test_greeting_rewinds_backoff() {
    let media = media().await;
    let (hub_url, accepted) = start_closing_hub(true).await;

    let config = ClientConfig::new(&hub_url, &media.manifest_url("movie1")).unwrap();
    let client = SyncClient::spawn(config, SimulatedPlayer::new());

    // A greeted link that drops is redialled immediately
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(accepted.load(Ordering::SeqCst) >= 2);

    client.shutdown();
    tokio_test::assert_ok!(
        tokio::time::timeout(Duration::from_secs(1), client.closed()).await
    );
}
