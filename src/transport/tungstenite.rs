use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Sink, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream,
    connect_async_tls_with_config as tungstenite_connect,
    tungstenite::{
        Message as TungsteniteMessage, Utf8Bytes,
        protocol::{CloseFrame as TungCloseFrame, WebSocketConfig},
    },
};

use crate::core::{WebSocketBufferConfig, WebSocketError, WsCloseFrame, WsFrame};
use crate::tls::install_rustls_crypto_provider;
use crate::transport::{WsTransport, WsTransportConnectFuture};

pub(crate) fn map_ws_error(context: &'static str, err: impl ToString) -> WebSocketError {
    WebSocketError::TransportError {
        context,
        error: err.to_string(),
    }
}

fn close_to_core(frame: Option<TungCloseFrame>) -> Option<WsCloseFrame> {
    frame.map(|f| WsCloseFrame {
        code: u16::from(f.code),
        reason: Bytes::from(f.reason),
    })
}

fn core_to_close(frame: WsCloseFrame) -> TungCloseFrame {
    TungCloseFrame {
        code: frame.code.into(),
        reason: Utf8Bytes::try_from(frame.reason).unwrap_or_else(|_| Utf8Bytes::from_static("")),
    }
}

pub(crate) fn msg_to_frame(msg: TungsteniteMessage) -> WsFrame {
    match msg {
        TungsteniteMessage::Text(text) => WsFrame::Text(Bytes::from(text)),
        TungsteniteMessage::Binary(bytes) => WsFrame::Binary(bytes),
        TungsteniteMessage::Ping(bytes) => WsFrame::Ping(bytes),
        TungsteniteMessage::Pong(bytes) => WsFrame::Pong(bytes),
        TungsteniteMessage::Close(frame) => WsFrame::Close(close_to_core(frame)),
        TungsteniteMessage::Frame(_) => WsFrame::Binary(Bytes::new()),
    }
}

pub(crate) fn frame_to_msg(frame: WsFrame) -> TungsteniteMessage {
    match frame {
        // Non-UTF-8 text falls back to a binary frame.
        WsFrame::Text(bytes) => match Utf8Bytes::try_from(bytes.clone()) {
            Ok(text) => TungsteniteMessage::Text(text),
            Err(_) => TungsteniteMessage::Binary(bytes),
        },
        WsFrame::Binary(bytes) => TungsteniteMessage::Binary(bytes),
        WsFrame::Ping(bytes) => TungsteniteMessage::Ping(bytes),
        WsFrame::Pong(bytes) => TungsteniteMessage::Pong(bytes),
        WsFrame::Close(frame) => TungsteniteMessage::Close(frame.map(core_to_close)),
    }
}

pub(crate) fn websocket_config(buffers: WebSocketBufferConfig) -> WebSocketConfig {
    let max_message = buffers.max_message_bytes.max(buffers.read_buffer_bytes);
    let max_frame = buffers.max_frame_bytes.max(buffers.read_buffer_bytes);
    WebSocketConfig::default()
        .max_message_size(Some(max_message))
        .max_frame_size(Some(max_frame))
        .write_buffer_size(buffers.write_buffer_bytes)
        .max_write_buffer_size(buffers.max_write_buffer_bytes)
}

/// `tokio-tungstenite` transport. Handles both `ws://` and `wss://` (rustls, webpki roots).
#[derive(Clone, Default)]
pub struct TungsteniteTransport {
    connector: Option<Connector>,
}

impl TungsteniteTransport {
    pub fn with_connector(connector: Connector) -> Self {
        Self {
            connector: Some(connector),
        }
    }

    /// Use a caller-built rustls config (custom roots, client certs).
    pub fn rustls(config: Arc<rustls::ClientConfig>) -> Self {
        Self::with_connector(Connector::Rustls(config))
    }
}

type TungsteniteStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TungsteniteReader {
    inner: futures_util::stream::SplitStream<TungsteniteStream>,
}

impl Stream for TungsteniteReader {
    type Item = Result<WsFrame, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(msg))) => Poll::Ready(Some(Ok(msg_to_frame(msg)))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(map_ws_error("read", err)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct TungsteniteWriter {
    inner: futures_util::stream::SplitSink<TungsteniteStream, TungsteniteMessage>,
}

impl Sink<WsFrame> for TungsteniteWriter {
    type Error = WebSocketError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_ready(cx)
            .map_err(|e| map_ws_error("write", e))
    }

    fn start_send(mut self: Pin<&mut Self>, item: WsFrame) -> Result<(), Self::Error> {
        Pin::new(&mut self.inner)
            .start_send(frame_to_msg(item))
            .map_err(|e| map_ws_error("write", e))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_flush(cx)
            .map_err(|e| map_ws_error("write", e))
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_close(cx)
            .map_err(|e| map_ws_error("write", e))
    }
}

impl WsTransport for TungsteniteTransport {
    type Reader = TungsteniteReader;
    type Writer = TungsteniteWriter;

    fn connect(
        &self,
        url: String,
        buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer> {
        let connector = self.connector.clone();
        Box::pin(async move {
            install_rustls_crypto_provider();

            // Third argument is `disable_nagle`.
            let (stream, _) = tungstenite_connect(url, Some(websocket_config(buffers)), true, connector)
                .await
                .map_err(|e| WebSocketError::ConnectionFailed(e.to_string()))?;

            let (write, read) = stream.split();
            Ok((
                TungsteniteReader { inner: read },
                TungsteniteWriter { inner: write },
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_map_to_text_messages() {
        let msg = frame_to_msg(WsFrame::text(r#"{"type":"PING"}"#));
        assert!(matches!(&msg, TungsteniteMessage::Text(t) if t.as_str() == r#"{"type":"PING"}"#));
        assert_eq!(
            msg_to_frame(msg),
            WsFrame::Text(Bytes::from_static(br#"{"type":"PING"}"#))
        );
    }

    #[test]
    fn invalid_utf8_text_degrades_to_binary() {
        let msg = frame_to_msg(WsFrame::Text(Bytes::from_static(&[0xff, 0x00])));
        assert!(matches!(msg, TungsteniteMessage::Binary(_)));
    }

    #[test]
    fn close_frames_keep_code_and_reason() {
        let msg = frame_to_msg(WsFrame::close(4000, "heartbeat timeout"));
        match msg_to_frame(msg) {
            WsFrame::Close(Some(frame)) => {
                assert_eq!(frame.code, 4000);
                assert_eq!(frame.reason_lossy(), "heartbeat timeout");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
