use std::time::Duration;

use game_ws::testing::{MockConnectPlan, MockTransport, next_event_of, record_events, wait_for_state};
use game_ws::{
    WsClientConfig, WsConnection, WsConnectionState, WsDisconnectReason, WsErrorKind, WsEventData,
    WsEventKind,
};

const WAIT: Duration = Duration::from_secs(60);

fn config() -> WsClientConfig {
    WsClientConfig::new("ws://game.test/ws")
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test(start_paused = true)]
async fn retries_with_growing_delay_until_exhausted() {
    let (transport, controller) = MockTransport::new();
    controller.set_fallback_plan(MockConnectPlan::Fail("connection refused".to_string()));
    let connection =
        WsConnection::spawn_with_transport(config().with_max_reconnect_attempts(3), transport);
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();

    let first = next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("failed attempt reported as disconnect");
    assert!(matches!(
        first.data,
        WsEventData::Disconnected {
            reason: WsDisconnectReason::NetworkError,
            code: 1006,
            ..
        }
    ));

    let mut schedule = Vec::new();
    let exhausted = loop {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("event before timeout")
            .expect("listener alive");
        match event.data {
            WsEventData::ReconnectAttempt {
                attempt,
                max_attempts,
                delay,
            } => {
                assert_eq!(max_attempts, 3);
                schedule.push((attempt, delay));
            }
            WsEventData::Error { kind, message } => break (kind, message),
            _ => {}
        }
    };

    assert_eq!(schedule, vec![(1, ms(1000)), (2, ms(1500)), (3, ms(2250))]);
    assert_eq!(exhausted.0, WsErrorKind::Connection);
    assert!(exhausted.1.contains('3'), "{}", exhausted.1);
    assert_eq!(controller.connect_attempts(), 4);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(controller.connect_attempts(), 4);
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Closed);

    let metrics = connection.metrics().await.unwrap();
    assert_eq!(metrics.reconnect_attempts, 3);
    assert_eq!(metrics.reconnect_successes, 0);
    assert!(metrics.errors >= 4);
}

#[tokio::test(start_paused = true)]
async fn backoff_resets_after_successful_reconnect() {
    let (transport, mut controller) = MockTransport::new();
    controller.push_plan(MockConnectPlan::Fail("refused".to_string()));
    controller.push_plan(MockConnectPlan::Fail("refused".to_string()));
    let connection = WsConnection::spawn_with_transport(config(), transport);
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("third dial accepted");
    let connected = next_event_of(&mut events, WsEventKind::Connected, WAIT)
        .await
        .expect("connected");
    assert!(matches!(connected.data, WsEventData::Connected { attempts: 2 }));
    assert_eq!(connection.metrics().await.unwrap().reconnect_successes, 1);

    server.drop_socket();
    let dropped = next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("disconnected");
    assert!(matches!(
        dropped.data,
        WsEventData::Disconnected {
            reason: WsDisconnectReason::NetworkError,
            code: 1006,
            ..
        }
    ));
    let attempt = next_event_of(&mut events, WsEventKind::ReconnectAttempt, WAIT)
        .await
        .expect("reconnect scheduled");
    assert!(matches!(
        attempt.data,
        WsEventData::ReconnectAttempt { attempt: 1, delay, .. } if delay == ms(1000)
    ));

    let _server = controller.next_server_timeout(WAIT).await.expect("reconnected");
    assert!(wait_for_state(&connection, WsConnectionState::Connected, WAIT).await);
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_reconnect() {
    let (transport, controller) = MockTransport::new();
    controller.set_fallback_plan(MockConnectPlan::Fail("refused".to_string()));
    let connection = WsConnection::spawn_with_transport(config(), transport);
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    next_event_of(&mut events, WsEventKind::ReconnectAttempt, WAIT)
        .await
        .expect("reconnect scheduled");
    assert_eq!(
        connection.state().await.unwrap(),
        WsConnectionState::Reconnecting
    );

    connection.disconnect().await.unwrap();
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Closed);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(controller.connect_attempts(), 1);
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event.kind(), WsEventKind::ReconnectAttempt | WsEventKind::Connected),
            "unexpected {:?}",
            event.data
        );
    }
}

#[tokio::test(start_paused = true)]
async fn auto_reconnect_off_stays_closed() {
    let (transport, mut controller) = MockTransport::new();
    let connection =
        WsConnection::spawn_with_transport(config().with_auto_reconnect(false), transport);
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");
    next_event_of(&mut events, WsEventKind::Connected, WAIT)
        .await
        .expect("connected");

    server.drop_socket();
    next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("disconnected");

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(controller.connect_attempts(), 1);
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Closed);
    assert_eq!(connection.metrics().await.unwrap().reconnect_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn manual_connect_while_reconnecting_dials_immediately() {
    let (transport, mut controller) = MockTransport::new();
    controller.push_plan(MockConnectPlan::Fail("refused".to_string()));
    let connection = WsConnection::spawn_with_transport(
        config().with_reconnect_backoff(Duration::from_secs(30), Duration::from_secs(60), 2.0),
        transport,
    );
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    next_event_of(&mut events, WsEventKind::ReconnectAttempt, WAIT)
        .await
        .expect("reconnect scheduled");

    connection.connect().await.unwrap();
    let _server = controller
        .next_server_timeout(Duration::from_secs(1))
        .await
        .expect("dialed without waiting for the backoff");
    assert!(wait_for_state(&connection, WsConnectionState::Connected, Duration::from_secs(1)).await);

    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(controller.connect_attempts(), 2);
    assert_eq!(connection.state().await.unwrap(), WsConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn zero_attempt_budget_exhausts_immediately() {
    let (transport, mut controller) = MockTransport::new();
    let connection =
        WsConnection::spawn_with_transport(config().with_max_reconnect_attempts(0), transport);
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    let mut server = controller.next_server_timeout(WAIT).await.expect("accepted");
    next_event_of(&mut events, WsEventKind::Connected, WAIT)
        .await
        .expect("connected");
    server.drop_socket();

    let error = next_event_of(&mut events, WsEventKind::Error, WAIT)
        .await
        .expect("exhaustion error");
    assert!(matches!(
        error.data,
        WsEventData::Error {
            kind: WsErrorKind::Connection,
            ..
        }
    ));
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(controller.connect_attempts(), 1);
    assert_eq!(connection.metrics().await.unwrap().reconnect_attempts, 0);
}
