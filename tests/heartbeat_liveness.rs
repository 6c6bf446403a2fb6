use std::time::Duration;

use game_ws::core::{CLOSE_HEARTBEAT_TIMEOUT, PING_FRAME, WsFrame};
use game_ws::testing::{MockTransport, next_event_of, record_events};
use game_ws::{
    WsClientConfig, WsConnection, WsConnectionState, WsDisconnectReason, WsEventData, WsEventKind,
};

const WAIT: Duration = Duration::from_secs(10);

fn config() -> WsClientConfig {
    WsClientConfig::new("ws://game.test/ws")
        .with_heartbeat(Duration::from_secs(1), Duration::from_millis(500))
}

#[tokio::test(start_paused = true)]
async fn answered_pings_keep_connection_and_record_latency() {
    let (transport, mut controller) = MockTransport::new();
    let connection = WsConnection::spawn_with_transport(config(), transport);
    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");

    for _ in 0..3 {
        assert_eq!(server.recv_text().await.as_deref(), Some(PING_FRAME));
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.send_pong().unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let metrics = connection.metrics().await.unwrap();
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Connected);
    assert_eq!(metrics.latency_samples, 3);
    let last = metrics.last_latency.expect("latency recorded");
    assert!(last >= Duration::from_millis(100) && last < Duration::from_millis(200), "{last:?}");
    assert!(metrics.average_latency.is_some());
    assert!(metrics.p99_latency.is_some());
    // Pongs are consumed by the heartbeat but still count as received frames.
    assert_eq!(metrics.messages_received, 3);
}

#[tokio::test(start_paused = true)]
async fn unanswered_ping_closes_with_heartbeat_code_and_reconnects() {
    let (transport, mut controller) = MockTransport::new();
    let connection = WsConnection::spawn_with_transport(config(), transport);
    let mut events = record_events(&connection).await.unwrap();
    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");

    assert_eq!(server.recv_text().await.as_deref(), Some(PING_FRAME));

    let event = next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("disconnected after missing pong");
    assert!(matches!(
        event.data,
        WsEventData::Disconnected {
            reason: WsDisconnectReason::NetworkError,
            code: CLOSE_HEARTBEAT_TIMEOUT,
            ..
        }
    ));

    match server.recv_outbound_timeout(WAIT).await {
        Some(WsFrame::Close(Some(frame))) => assert_eq!(frame.code, CLOSE_HEARTBEAT_TIMEOUT),
        other => panic!("expected close frame, got {other:?}"),
    }

    assert!(next_event_of(&mut events, WsEventKind::ReconnectAttempt, WAIT).await.is_some());
    let _server = controller.next_server_timeout(WAIT).await.expect("reconnected");
    assert!(next_event_of(&mut events, WsEventKind::Connected, WAIT).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn no_pings_without_heartbeat_interval() {
    let (transport, mut controller) = MockTransport::new();
    let connection = WsConnection::spawn_with_transport(
        WsClientConfig::new("ws://game.test/ws"),
        transport,
    );
    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");

    assert!(server.recv_outbound_timeout(Duration::from_secs(30)).await.is_none());
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_stops_after_disconnect() {
    let (transport, mut controller) = MockTransport::new();
    let connection = WsConnection::spawn_with_transport(config(), transport);
    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");
    assert_eq!(server.recv_text().await.as_deref(), Some(PING_FRAME));
    server.send_pong().unwrap();

    connection.disconnect().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let pings = server
        .drain_outbound()
        .into_iter()
        .filter(|frame| matches!(frame, WsFrame::Text(_)))
        .count();
    assert_eq!(pings, 0);
}
