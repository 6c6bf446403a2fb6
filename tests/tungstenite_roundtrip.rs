use std::time::Duration;

use game_ws::client::accept_async;
use game_ws::core::WsFrame;
use game_ws::testing::{next_event_of, record_events};
use game_ws::{
    OpaqueCommand, WsClientConfig, WsConnection, WsDisconnectReason, WsEventData, WsEventKind,
    WsSendOptions,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

/// Echo server that closes with 1001 when it receives `"bye"`.
async fn spawn_server() -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let Ok(mut peer) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(frame)) = peer.next().await {
                    let WsFrame::Text(bytes) = frame else {
                        continue;
                    };
                    let text = String::from_utf8_lossy(bytes.as_ref()).into_owned();
                    let _ = seen_tx.send(text.clone());
                    if text == "bye" {
                        let _ = peer.close(1001, "going away").await;
                        break;
                    }
                    if peer
                        .send_text(format!(r#"{{"type":"ECHO","text":"{text}"}}"#))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
    });

    (format!("ws://{addr}/ws"), seen_rx)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sends_and_receives_over_real_socket() {
    let (url, mut seen) = spawn_server().await;
    let connection = WsConnection::spawn(
        WsClientConfig::new(url)
            .with_auth_token("abc")
            .with_auto_reconnect(false),
    );
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    next_event_of(&mut events, WsEventKind::Connected, WAIT)
        .await
        .expect("connected");

    connection
        .send(OpaqueCommand::text("hello"), WsSendOptions::default())
        .await
        .unwrap();
    assert_eq!(
        tokio::time::timeout(WAIT, seen.recv()).await.unwrap().as_deref(),
        Some("hello")
    );

    let event = next_event_of(&mut events, WsEventKind::Message, WAIT)
        .await
        .expect("echo");
    match event.data {
        WsEventData::Message { raw, .. } => assert_eq!(raw, r#"{"type":"ECHO","text":"hello"}"#),
        other => panic!("unexpected {other:?}"),
    }

    connection.destroy().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_close_is_reported_as_server_initiated() {
    let (url, _seen) = spawn_server().await;
    let connection = WsConnection::spawn(WsClientConfig::new(url).with_auto_reconnect(false));
    let mut events = record_events(&connection).await.unwrap();

    connection.connect().await.unwrap();
    next_event_of(&mut events, WsEventKind::Connected, WAIT)
        .await
        .expect("connected");
    connection
        .send(OpaqueCommand::text("bye"), WsSendOptions::default())
        .await
        .unwrap();

    let event = next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("disconnected");
    match event.data {
        WsEventData::Disconnected {
            reason,
            code,
            detail,
            ..
        } => {
            assert_eq!(reason, WsDisconnectReason::ServerInitiated);
            assert_eq!(code, 1001);
            assert_eq!(detail, "going away");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refused_connection_reports_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let connection = WsConnection::spawn(
        WsClientConfig::new(format!("ws://{addr}/ws")).with_auto_reconnect(false),
    );
    let mut events = record_events(&connection).await.unwrap();
    connection.connect().await.unwrap();

    let event = next_event_of(&mut events, WsEventKind::Disconnected, WAIT)
        .await
        .expect("disconnected");
    assert!(matches!(
        event.data,
        WsEventData::Disconnected {
            reason: WsDisconnectReason::NetworkError,
            code: 1006,
            ..
        }
    ));
}
