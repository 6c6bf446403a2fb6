//! Server-side socket helper for local game servers, tests and demos.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{WebSocketStream, accept_async_with_config};

use crate::core::{WebSocketBufferConfig, WebSocketError, WsFrame};
use crate::transport::tungstenite::{frame_to_msg, map_ws_error, msg_to_frame, websocket_config};

/// Accepted websocket peer, speaking [`WsFrame`]s.
pub struct WsClient {
    inner: WebSocketStream<TcpStream>,
}

impl WsClient {
    pub async fn send(&mut self, frame: WsFrame) -> Result<(), WebSocketError> {
        self.inner
            .send(frame_to_msg(frame))
            .await
            .map_err(|e| map_ws_error("write", e))
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), WebSocketError> {
        self.send(WsFrame::text(text)).await
    }

    pub async fn next(&mut self) -> Option<Result<WsFrame, WebSocketError>> {
        self.inner
            .next()
            .await
            .map(|res| res.map(msg_to_frame).map_err(|e| map_ws_error("read", e)))
    }

    /// Send a close frame and flush.
    pub async fn close(&mut self, code: u16, reason: &str) -> Result<(), WebSocketError> {
        self.send(WsFrame::close(code, reason)).await
    }
}

/// Accept an incoming websocket connection with default buffer limits.
pub async fn accept_async(stream: TcpStream) -> Result<WsClient, WebSocketError> {
    accept_with_buffers(stream, WebSocketBufferConfig::default()).await
}

pub async fn accept_with_buffers(
    stream: TcpStream,
    buffers: WebSocketBufferConfig,
) -> Result<WsClient, WebSocketError> {
    let ws = accept_async_with_config(stream, Some(websocket_config(buffers)))
        .await
        .map_err(|err| WebSocketError::ConnectionFailed(err.to_string()))?;
    Ok(WsClient { inner: ws })
}
