use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use sonic_rs::{JsonValueTrait, Value};

use super::types::{WebSocketError, WebSocketResult};

/// Heartbeat frame sent by the client.
pub const PING_FRAME: &str = r#"{"type":"PING"}"#;

const PONG_TYPE: &str = "PONG";

/// Collaborator-supplied serializer for an outbound command.
///
/// The transport never inspects the command; it only asks for the wire text at transmit time.
pub trait WsWireEncode: Send + Sync + 'static {
    fn encode(&self) -> WebSocketResult<String>;
}

struct JsonEncode<T>(T);

impl<T> WsWireEncode for JsonEncode<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn encode(&self) -> WebSocketResult<String> {
        sonic_rs::to_string(&self.0).map_err(|err| WebSocketError::SerializeFailed(err.to_string()))
    }
}

struct TextEncode(String);

impl WsWireEncode for TextEncode {
    fn encode(&self) -> WebSocketResult<String> {
        Ok(self.0.clone())
    }
}

/// Opaque, lazily serialized outbound command.
#[derive(Clone)]
pub struct OpaqueCommand {
    encoder: Arc<dyn WsWireEncode>,
}

impl OpaqueCommand {
    /// Serialize `value` as JSON when the command is transmitted.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::from_encoder(JsonEncode(value))
    }

    /// Pre-serialized wire text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_encoder(TextEncode(text.into()))
    }

    pub fn from_encoder(encoder: impl WsWireEncode) -> Self {
        Self {
            encoder: Arc::new(encoder),
        }
    }

    pub fn to_wire(&self) -> WebSocketResult<String> {
        self.encoder.encode()
    }
}

impl fmt::Debug for OpaqueCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueCommand(..)")
    }
}

type SuccessCallback = Box<dyn FnOnce() + Send>;
type ErrorCallback = Box<dyn FnOnce(&WebSocketError) + Send>;

/// Completion callbacks attached to a send; each fires at most once.
#[derive(Default)]
pub struct WsSendCallbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl WsSendCallbacks {
    pub fn succeed(self) {
        if let Some(cb) = self.on_success {
            cb();
        }
    }

    pub fn fail(self, err: &WebSocketError) {
        if let Some(cb) = self.on_error {
            cb(err);
        }
    }
}

impl fmt::Debug for WsSendCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSendCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Per-send options. Queuing while offline is on by default.
#[derive(Debug)]
pub struct WsSendOptions {
    pub queue: bool,
    callbacks: WsSendCallbacks,
}

impl Default for WsSendOptions {
    fn default() -> Self {
        Self {
            queue: true,
            callbacks: WsSendCallbacks::default(),
        }
    }
}

impl WsSendOptions {
    /// Fail immediately instead of queuing when not connected.
    pub fn no_queue(mut self) -> Self {
        self.queue = false;
        self
    }

    pub fn on_success(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.callbacks.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&WebSocketError) + Send + 'static) -> Self {
        self.callbacks.on_error = Some(Box::new(f));
        self
    }

    pub fn into_parts(self) -> (bool, WsSendCallbacks) {
        (self.queue, self.callbacks)
    }
}

/// Classified inbound data frame.
#[derive(Debug, Clone)]
pub enum WsInbound {
    /// Heartbeat reply; consumed by the heartbeat manager.
    Pong,
    /// Anything else, forwarded to collaborators.
    Data { data: Value, raw: String },
}

impl WsInbound {
    pub fn parse(bytes: &Bytes) -> WebSocketResult<Self> {
        let raw = std::str::from_utf8(bytes.as_ref())
            .map_err(|err| WebSocketError::ParseFailed(format!("invalid utf-8: {err}")))?;
        let data: Value =
            sonic_rs::from_str(raw).map_err(|err| WebSocketError::ParseFailed(err.to_string()))?;

        if data.get("type").and_then(|ty| ty.as_str()) == Some(PONG_TYPE) {
            return Ok(WsInbound::Pong);
        }

        Ok(WsInbound::Data {
            data,
            raw: raw.to_string(),
        })
    }
}
