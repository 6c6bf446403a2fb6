//! Kameo-based resilient websocket transport for a single game-server connection.
//!
//! [`WsConnection`] is the entry point: it owns one connection actor that handles
//! reconnection with exponential backoff, an application-level heartbeat, a bounded
//! offline queue that flushes on reconnect, and a typed event/metrics surface.

pub mod client;
pub mod core;
pub mod testing;
pub mod tls;
pub mod transport;
pub mod ws;

pub use crate::core::{
    OpaqueCommand, WebSocketError, WebSocketResult, WsClientConfig, WsClientOrigin,
    WsConnectionMetrics, WsConnectionState, WsDisconnectReason, WsErrorKind, WsEvent,
    WsEventData, WsEventKind, WsListenerId, WsSendOptions, WsSendOutcome,
};
pub use transport::{TungsteniteTransport, WsTransport};
pub use ws::{WebSocketActor, WsConnection};
