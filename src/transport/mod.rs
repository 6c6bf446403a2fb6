use std::future::Future;
use std::pin::Pin;

use futures_util::{Sink, Stream};

use crate::core::{WebSocketBufferConfig, WebSocketError, WsFrame};

pub mod tungstenite;

pub use tungstenite::TungsteniteTransport;

/// Future returned by [`WsTransport::connect`].
pub type WsTransportConnectFuture<R, W> =
    Pin<Box<dyn Future<Output = Result<(R, W), WebSocketError>> + Send>>;

/// Transport boundary for websocket IO.
///
/// The connection actor owns state and policy; the transport only dials and hands back a
/// frame stream and a frame sink. Tests swap in [`crate::testing::MockTransport`].
pub trait WsTransport: Clone + Send + Sync + 'static {
    type Reader: Stream<Item = Result<WsFrame, WebSocketError>> + Send + Unpin + 'static;
    type Writer: Sink<WsFrame, Error = WebSocketError> + Send + Unpin + 'static;

    fn connect(
        &self,
        url: String,
        buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer>;
}
