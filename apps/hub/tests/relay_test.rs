//! Integration tests for the WebSocket relay
//!
//! Every test runs a real hub on an ephemeral port and drives it with raw
//! protocol peers.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use tokio_tungstenite::tungstenite;

use common::TestHub;
use lockstep_hub::Config;
use lockstep_protocol::ServerMessage;
use lockstep_test_utils::WsTestClient;

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_connect_registers_session() {
    let hub = TestHub::start().await;

    let mut peer = WsTestClient::connect(&hub.ws_url()).await;
    let greeting = peer.expect_connected().await;

    assert!(greeting.connected_at > 0);
    assert!(hub.registry.is_connected(&greeting.session_id));
    assert_eq!(hub.registry.session_count(), 1);

    hub.stop().await;
}

#[tokio::test]
async fn test_event_reaches_every_other_session_once() {
    let hub = TestHub::start().await;
    let mut leader = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut first = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut second = WsTestClient::connect_ready(&hub.ws_url()).await;

    leader.send_event("play", 12.5).await;

    for follower in [&mut first, &mut second] {
        let sync = follower.recv_sync().await;
        assert_eq!(sync.action, "play");
        assert_eq!(sync.time, 12.5);
        follower.expect_silence(QUIET).await;
    }

    // Never echoed back to the sender
    leader.expect_silence(QUIET).await;

    hub.stop().await;
}

#[tokio::test]
async fn test_events_from_one_sender_keep_their_order() {
    let hub = TestHub::start().await;
    let mut leader = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut follower = WsTestClient::connect_ready(&hub.ws_url()).await;

    leader.send_event("seek", 42.3).await;
    leader.send_event("play", 42.3).await;
    leader.send_event("heartbeat", 45.3).await;
    leader.send_event("pause", 47.0).await;

    let received: Vec<_> = [
        follower.recv_sync().await,
        follower.recv_sync().await,
        follower.recv_sync().await,
        follower.recv_sync().await,
    ]
    .into_iter()
    .map(|sync| (sync.action, sync.time))
    .collect();

    assert_eq!(
        received,
        vec![
            ("seek".to_string(), 42.3),
            ("play".to_string(), 42.3),
            ("heartbeat".to_string(), 45.3),
            ("pause".to_string(), 47.0),
        ]
    );

    hub.stop().await;
}

#[tokio::test]
async fn test_unknown_action_is_relayed_verbatim() {
    let hub = TestHub::start().await;
    let mut sender = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut receiver = WsTestClient::connect_ready(&hub.ws_url()).await;

    sender.send_event("rewind", 3.0).await;

    let sync = receiver.recv_sync().await;
    assert_eq!(sync.action, "rewind");
    assert_eq!(sync.time, 3.0);

    hub.stop().await;
}

#[test_log::test(tokio::test)]
async fn test_malformed_frame_answers_sender_only() {
    let hub = TestHub::start().await;
    let mut sender = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut receiver = WsTestClient::connect_ready(&hub.ws_url()).await;

    sender.send_raw("{not json").await;

    assert_matches!(
        sender.recv().await,
        Some(ServerMessage::Error(payload)) if payload.code == "INVALID_MESSAGE"
    );
    receiver.expect_silence(QUIET).await;

    // The session survives a bad frame
    sender.send_event("pause", 8.0).await;
    assert_eq!(receiver.recv_sync().await.action, "pause");

    hub.stop().await;
}

#[tokio::test]
async fn test_lone_session_relays_to_nobody() {
    let hub = TestHub::start().await;
    let mut solo = WsTestClient::connect_ready(&hub.ws_url()).await;

    solo.send_event("play", 0.0).await;
    solo.expect_silence(QUIET).await;

    hub.stop().await;
}

#[tokio::test]
async fn test_closed_session_is_removed() {
    let hub = TestHub::start().await;
    let leaving = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut staying = WsTestClient::connect_ready(&hub.ws_url()).await;
    let mut sender = WsTestClient::connect_ready(&hub.ws_url()).await;
    hub.wait_for_sessions(3).await;

    leaving.close().await;
    hub.wait_for_sessions(2).await;

    sender.send_event("seek", 99.0).await;
    assert_eq!(staying.recv_sync().await.time, 99.0);

    hub.stop().await;
}

#[tokio::test]
async fn test_registry_disconnect_closes_socket() {
    let hub = TestHub::start().await;
    let mut peer = WsTestClient::connect(&hub.ws_url()).await;
    let greeting = peer.expect_connected().await;

    assert!(hub.registry.disconnect(&greeting.session_id));
    assert!(peer.closed_within(Duration::from_secs(2)).await);

    hub.stop().await;
}

#[test_log::test(tokio::test)]
async fn test_capacity_rejects_extra_sessions() {
    let config = Config {
        max_sessions: 1,
        ..Config::default()
    };
    let hub = TestHub::start_with(config).await;

    let _first = WsTestClient::connect_ready(&hub.ws_url()).await;

    let err = WsTestClient::try_connect(&hub.ws_url())
        .await
        .err()
        .expect("second session should be refused");
    assert_matches!(
        err,
        tungstenite::Error::Http(response) if response.status().as_u16() == 503
    );
    assert_eq!(hub.registry.session_count(), 1);

    hub.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_open_sessions() {
    let hub = TestHub::start().await;
    let mut peer = WsTestClient::connect_ready(&hub.ws_url()).await;
    let registry = hub.registry.clone();

    hub.stop().await;

    assert!(peer.closed_within(Duration::from_secs(2)).await);
    assert_eq!(registry.session_count(), 0);
}
