//! Reusable test utilities for exercising the connection actor without a real socket.
//!
//! [`MockTransport`] scripts the outcome of each connect attempt and hands the test a
//! [`MockServer`] for every accepted connection, so tests can read outbound frames, push
//! inbound text, send close frames, or drop the socket.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Sink;
use tokio::sync::mpsc;

use crate::core::{WebSocketBufferConfig, WebSocketError, WsEvent, WsEventKind, WsFrame};
use crate::transport::{WsTransport, WsTransportConnectFuture};
use crate::ws::{WsConnection, WebSocketResult};

/// Outcome of one scripted connect attempt.
#[derive(Clone, Debug)]
pub enum MockConnectPlan {
    /// Handshake succeeds; a [`MockServer`] is delivered to the controller.
    Accept,
    /// Handshake fails with this message.
    Fail(String),
    /// Handshake never completes (exercises the connection timeout).
    Hang,
}

struct MockState {
    plans: VecDeque<MockConnectPlan>,
    fallback: MockConnectPlan,
    attempts: usize,
    urls: Vec<String>,
    servers_tx: mpsc::UnboundedSender<MockServer>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory transport driven by a [`MockController`].
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Build a transport + controller pair. Unscripted attempts are accepted.
    pub fn new() -> (Self, MockController) {
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(MockState {
            plans: VecDeque::new(),
            fallback: MockConnectPlan::Accept,
            attempts: 0,
            urls: Vec::new(),
            servers_tx,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockController {
                state,
                servers_rx,
            },
        )
    }
}

impl WsTransport for MockTransport {
    type Reader = MockReader;
    type Writer = MockWriter;

    fn connect(
        &self,
        url: String,
        _buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let (plan, servers_tx) = {
                let mut guard = lock(&state);
                guard.attempts += 1;
                guard.urls.push(url);
                let plan = guard
                    .plans
                    .pop_front()
                    .unwrap_or_else(|| guard.fallback.clone());
                (plan, guard.servers_tx.clone())
            };

            match plan {
                MockConnectPlan::Accept => {
                    let (sent_tx, outbound_rx) = mpsc::unbounded_channel();
                    let (inbound_tx, rx) = mpsc::unbounded_channel();
                    let _ = servers_tx.send(MockServer {
                        outbound_rx,
                        inbound_tx: Some(inbound_tx),
                    });
                    Ok((MockReader { rx }, MockWriter { sent_tx }))
                }
                MockConnectPlan::Fail(message) => Err(WebSocketError::ConnectionFailed(message)),
                MockConnectPlan::Hang => std::future::pending().await,
            }
        })
    }
}

/// Test-side control over a [`MockTransport`].
pub struct MockController {
    state: Arc<Mutex<MockState>>,
    servers_rx: mpsc::UnboundedReceiver<MockServer>,
}

impl MockController {
    /// Script the next connect attempt. Plans are consumed in order.
    pub fn push_plan(&self, plan: MockConnectPlan) {
        lock(&self.state).plans.push_back(plan);
    }

    /// Plan used once the scripted ones run out.
    pub fn set_fallback_plan(&self, plan: MockConnectPlan) {
        lock(&self.state).fallback = plan;
    }

    pub fn connect_attempts(&self) -> usize {
        lock(&self.state).attempts
    }

    pub fn dialed_urls(&self) -> Vec<String> {
        lock(&self.state).urls.clone()
    }

    /// Wait for the next accepted connection.
    pub async fn next_server(&mut self) -> Option<MockServer> {
        self.servers_rx.recv().await
    }

    pub async fn next_server_timeout(&mut self, timeout: Duration) -> Option<MockServer> {
        tokio::time::timeout(timeout, self.servers_rx.recv())
            .await
            .unwrap_or_default()
    }
}

/// Error surface for operations on [`MockServer`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MockServerError {
    /// The inbound socket side was intentionally dropped.
    SocketDropped,
    /// The client side is no longer reading.
    ChannelClosed,
}

impl std::fmt::Display for MockServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockServerError::SocketDropped => f.write_str("mock socket already dropped"),
            MockServerError::ChannelClosed => f.write_str("mock client channel is closed"),
        }
    }
}

impl std::error::Error for MockServerError {}

/// Server side of one accepted mock connection.
pub struct MockServer {
    outbound_rx: mpsc::UnboundedReceiver<WsFrame>,
    inbound_tx: Option<mpsc::UnboundedSender<WsFrame>>,
}

impl MockServer {
    /// Receive a frame written by the client.
    pub async fn recv_outbound(&mut self) -> Option<WsFrame> {
        self.outbound_rx.recv().await
    }

    pub async fn recv_outbound_timeout(&mut self, timeout: Duration) -> Option<WsFrame> {
        tokio::time::timeout(timeout, self.outbound_rx.recv())
            .await
            .unwrap_or_default()
    }

    /// Next outbound text frame as a string, skipping anything else.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.outbound_rx.recv().await? {
                WsFrame::Text(bytes) => {
                    return Some(String::from_utf8_lossy(bytes.as_ref()).into_owned());
                }
                _ => continue,
            }
        }
    }

    /// Outbound frames already written, without waiting.
    pub fn drain_outbound(&mut self) -> Vec<WsFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound_rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn send_inbound(&self, frame: WsFrame) -> Result<(), MockServerError> {
        let Some(tx) = self.inbound_tx.as_ref() else {
            return Err(MockServerError::SocketDropped);
        };
        tx.send(frame).map_err(|_| MockServerError::ChannelClosed)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), MockServerError> {
        self.send_inbound(WsFrame::text(text))
    }

    /// Reply to a heartbeat ping.
    pub fn send_pong(&self) -> Result<(), MockServerError> {
        self.send_text(r#"{"type":"PONG"}"#)
    }

    /// Close the socket from the server side with a close frame.
    pub fn send_close(&mut self, code: u16, reason: &str) -> Result<(), MockServerError> {
        let result = self.send_inbound(WsFrame::close(code, reason));
        self.inbound_tx = None;
        result
    }

    /// Simulate an abrupt drop (no close frame).
    pub fn drop_socket(&mut self) {
        self.inbound_tx = None;
    }

    /// Make every further client write fail while the read side stays open.
    pub fn reject_writes(&mut self) {
        self.outbound_rx.close();
    }
}

/// Reader side for [`MockTransport`].
pub struct MockReader {
    rx: mpsc::UnboundedReceiver<WsFrame>,
}

impl futures_util::Stream for MockReader {
    type Item = Result<WsFrame, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.rx).poll_recv(cx) {
            Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Writer side for [`MockTransport`].
pub struct MockWriter {
    sent_tx: mpsc::UnboundedSender<WsFrame>,
}

impl Sink<WsFrame> for MockWriter {
    type Error = WebSocketError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: WsFrame) -> Result<(), Self::Error> {
        self.get_mut()
            .sent_tx
            .send(item)
            .map_err(|_| WebSocketError::TransportError {
                context: "mock_transport_write",
                error: "mock outbound channel closed".to_string(),
            })
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Listener that forwards every event it sees into a channel.
pub fn event_listener() -> (
    impl Fn(&WsEvent) + Send + Sync + Clone + 'static,
    mpsc::UnboundedReceiver<WsEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = move |event: &WsEvent| {
        let _ = tx.send(event.clone());
    };
    (listener, rx)
}

/// Subscribe one channel to every event kind.
pub async fn record_events<T: WsTransport>(
    connection: &WsConnection<T>,
) -> WebSocketResult<mpsc::UnboundedReceiver<WsEvent>> {
    let (listener, rx) = event_listener();
    for kind in WsEventKind::ALL {
        connection.on(kind, listener.clone()).await?;
    }
    Ok(rx)
}

/// Wait for the next event of `kind`, discarding others.
pub async fn next_event_of(
    events: &mut mpsc::UnboundedReceiver<WsEvent>,
    kind: WsEventKind,
    timeout: Duration,
) -> Option<WsEvent> {
    tokio::time::timeout(timeout, async {
        while let Some(event) = events.recv().await {
            if event.kind() == kind {
                return Some(event);
            }
        }
        None
    })
    .await
    .unwrap_or_default()
}

/// Poll the connection state until it matches or the timeout elapses.
pub async fn wait_for_state<T: WsTransport>(
    connection: &WsConnection<T>,
    state: crate::core::WsConnectionState,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if matches!(connection.state().await, Ok(current) if current == state) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
