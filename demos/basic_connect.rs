//! Connects to a local echo server, sends a few commands and prints the metrics.
//!
//! Run with `RUST_LOG=game_ws=debug` to see frame-level logging.

use std::time::Duration;

use game_ws::client::accept_async;
use game_ws::core::WsFrame;
use game_ws::{
    OpaqueCommand, WsClientConfig, WsConnection, WsEventData, WsEventKind, WsSendOptions,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct MoveCommand {
    #[serde(rename = "type")]
    kind: &'static str,
    dx: i32,
    dy: i32,
}

async fn run_echo_server(listener: TcpListener) {
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(async move {
            let Ok(mut peer) = accept_async(stream).await else {
                return;
            };
            while let Some(Ok(frame)) = peer.next().await {
                let WsFrame::Text(bytes) = frame else {
                    continue;
                };
                let text = String::from_utf8_lossy(bytes.as_ref()).into_owned();
                let reply = if text.contains(r#""PING""#) {
                    r#"{"type":"PONG"}"#.to_string()
                } else {
                    format!(r#"{{"type":"ECHO","payload":{text}}}"#)
                };
                if peer.send_text(reply).await.is_err() {
                    break;
                }
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("game_ws=info")),
        )
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(run_echo_server(listener));

    let config = WsClientConfig::new(format!("ws://{addr}/ws"))
        .with_heartbeat(Duration::from_millis(500), Duration::from_secs(2))
        .with_debug(true);
    let connection = WsConnection::spawn(config);

    connection
        .on(WsEventKind::Message, |event| {
            if let WsEventData::Message { raw, .. } = &event.data {
                println!("server says: {raw}");
            }
        })
        .await?;
    connection
        .on(WsEventKind::StateChange, |event| {
            if let WsEventData::StateChange { previous, current } = &event.data {
                println!("state: {previous} -> {current}");
            }
        })
        .await?;

    // Queued while offline, flushed once the socket opens.
    let outcome = connection
        .send(
            OpaqueCommand::json(MoveCommand {
                kind: "MOVE",
                dx: 1,
                dy: 0,
            }),
            WsSendOptions::default(),
        )
        .await?;
    println!("first command: {outcome:?}");

    connection.connect().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    connection
        .send(
            OpaqueCommand::json(MoveCommand {
                kind: "MOVE",
                dx: 0,
                dy: -1,
            }),
            WsSendOptions::default().on_success(|| println!("second command sent")),
        )
        .await?;

    tokio::time::sleep(Duration::from_millis(1200)).await;
    println!("metrics: {:#?}", connection.metrics().await?);

    connection.destroy().await?;
    Ok(())
}
