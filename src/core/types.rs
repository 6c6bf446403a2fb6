use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Convenience result alias for websocket operations.
pub type WebSocketResult<T> = Result<T, WebSocketError>;

/// Close code sent on a caller-initiated disconnect.
pub const CLOSE_NORMAL: u16 = 1000;
/// Peer is going away (server shutdown, page navigation).
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Close frame carried no status code.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Connection dropped without a close frame: handshake failure, read error, timeout.
pub const CLOSE_ABNORMAL: u16 = 1006;
/// Application code used when the heartbeat declares the connection dead.
pub const CLOSE_HEARTBEAT_TIMEOUT: u16 = 4000;

/// Canonical websocket error surface shared across the crate.
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport error ({context}): {error}")]
    TransportError {
        context: &'static str,
        error: String,
    },

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Serialization failed: {0}")]
    SerializeFailed(String),

    #[error("Timeout: {context}")]
    Timeout { context: String },

    #[error("Not connected (state={state})")]
    NotConnected { state: WsConnectionState },

    #[error("Outbound queue rejected the message (capacity={capacity})")]
    QueueRejected { capacity: usize },

    #[error("Queued message evicted: outbound queue full (capacity={capacity})")]
    QueueOverflow { capacity: usize },

    #[error("Max reconnection attempts ({max_attempts}) exceeded")]
    ReconnectExhausted { max_attempts: u32 },

    #[error("Connection destroyed")]
    Destroyed,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Actor error: {0}")]
    ActorError(String),
}

impl WebSocketError {
    /// Category reported on `error` events.
    pub fn kind(&self) -> WsErrorKind {
        match self {
            WebSocketError::ConnectionFailed(_)
            | WebSocketError::Timeout { .. }
            | WebSocketError::ReconnectExhausted { .. } => WsErrorKind::Connection,
            WebSocketError::TransportError { .. }
            | WebSocketError::SerializeFailed(_)
            | WebSocketError::NotConnected { .. }
            | WebSocketError::QueueRejected { .. }
            | WebSocketError::QueueOverflow { .. } => WsErrorKind::Send,
            WebSocketError::ParseFailed(_) => WsErrorKind::Parse,
            WebSocketError::Destroyed
            | WebSocketError::InvalidConfig(_)
            | WebSocketError::ActorError(_) => WsErrorKind::Unknown,
        }
    }
}

/// Error taxonomy carried by `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsErrorKind {
    /// Failed to establish, or reconnection attempts exhausted.
    Connection,
    /// Serialization or transmission failure.
    Send,
    /// Malformed inbound frame.
    Parse,
    Unknown,
}

/// Connection state machine owned by the connection actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsConnectionState {
    Connecting,
    Connected,
    Closing,
    Closed,
    Reconnecting,
}

impl WsConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            WsConnectionState::Connecting => "connecting",
            WsConnectionState::Connected => "connected",
            WsConnectionState::Closing => "closing",
            WsConnectionState::Closed => "closed",
            WsConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for WsConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection ended, inferred from the close code and the manual-disconnect flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsDisconnectReason {
    Manual,
    NetworkError,
    ServerInitiated,
    Unknown,
}

impl WsDisconnectReason {
    pub fn classify(code: u16, manual: bool) -> Self {
        if manual {
            return WsDisconnectReason::Manual;
        }
        match code {
            CLOSE_NORMAL | CLOSE_GOING_AWAY => WsDisconnectReason::ServerInitiated,
            CLOSE_ABNORMAL | CLOSE_HEARTBEAT_TIMEOUT => WsDisconnectReason::NetworkError,
            _ => WsDisconnectReason::Unknown,
        }
    }
}

/// Result of a successful `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsSendOutcome {
    /// Handed to the socket writer.
    Sent,
    /// Held in the outbound queue until the next successful connection.
    Queued,
}

/// Transport-independent buffer sizing parameters used for websocket configuration.
#[derive(Clone, Copy, Debug)]
pub struct WebSocketBufferConfig {
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
    pub max_write_buffer_bytes: usize,
    pub max_message_bytes: usize,
    pub max_frame_bytes: usize,
}

impl Default for WebSocketBufferConfig {
    fn default() -> Self {
        Self {
            // World snapshots can be large; keep the read side roomy.
            read_buffer_bytes: 16 * 1024 * 1024,
            write_buffer_bytes: 128 << 10,
            max_write_buffer_bytes: 256 << 10,
            max_message_bytes: 16 * 1024 * 1024,
            max_frame_bytes: 16 * 1024 * 1024,
        }
    }
}

#[inline]
pub(crate) fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u64::MAX as u128) as u64
}
