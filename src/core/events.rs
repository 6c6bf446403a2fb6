use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sonic_rs::Value;
use tracing::warn;

use super::types::{WsConnectionState, WsDisconnectReason, WsErrorKind};

/// Event kinds a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsEventKind {
    Connected,
    Disconnected,
    Message,
    Error,
    ReconnectAttempt,
    StateChange,
    MessageSent,
    AuthChange,
}

impl WsEventKind {
    pub const ALL: [WsEventKind; 8] = [
        WsEventKind::Connected,
        WsEventKind::Disconnected,
        WsEventKind::Message,
        WsEventKind::Error,
        WsEventKind::ReconnectAttempt,
        WsEventKind::StateChange,
        WsEventKind::MessageSent,
        WsEventKind::AuthChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WsEventKind::Connected => "connected",
            WsEventKind::Disconnected => "disconnected",
            WsEventKind::Message => "message",
            WsEventKind::Error => "error",
            WsEventKind::ReconnectAttempt => "reconnect_attempt",
            WsEventKind::StateChange => "state_change",
            WsEventKind::MessageSent => "message_sent",
            WsEventKind::AuthChange => "auth_change",
        }
    }
}

/// Kind-specific event payload.
#[derive(Debug, Clone)]
pub enum WsEventData {
    Connected {
        /// Reconnect attempts it took to get here (0 for a first-try connect).
        attempts: u32,
    },
    Disconnected {
        reason: WsDisconnectReason,
        code: u16,
        detail: String,
        was_authenticated: bool,
    },
    Message {
        data: Value,
        raw: String,
    },
    Error {
        kind: WsErrorKind,
        message: String,
    },
    ReconnectAttempt {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
    StateChange {
        previous: WsConnectionState,
        current: WsConnectionState,
    },
    MessageSent {
        raw: String,
    },
    AuthChange {
        authenticated: bool,
    },
}

impl WsEventData {
    pub fn kind(&self) -> WsEventKind {
        match self {
            WsEventData::Connected { .. } => WsEventKind::Connected,
            WsEventData::Disconnected { .. } => WsEventKind::Disconnected,
            WsEventData::Message { .. } => WsEventKind::Message,
            WsEventData::Error { .. } => WsEventKind::Error,
            WsEventData::ReconnectAttempt { .. } => WsEventKind::ReconnectAttempt,
            WsEventData::StateChange { .. } => WsEventKind::StateChange,
            WsEventData::MessageSent { .. } => WsEventKind::MessageSent,
            WsEventData::AuthChange { .. } => WsEventKind::AuthChange,
        }
    }
}

/// A timestamped lifecycle event.
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub at: SystemTime,
    pub data: WsEventData,
}

impl WsEvent {
    pub fn now(data: WsEventData) -> Self {
        Self {
            at: SystemTime::now(),
            data,
        }
    }

    pub fn kind(&self) -> WsEventKind {
        self.data.kind()
    }
}

pub type WsListener = Arc<dyn Fn(&WsEvent) + Send + Sync>;

/// Handle returned by `on`/`once`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WsListenerId(u64);

#[derive(Clone)]
struct Registration {
    id: WsListenerId,
    once: bool,
    listener: WsListener,
}

/// Typed publish/subscribe registry.
///
/// `emit` walks a snapshot of the listener set, so listeners may unsubscribe (or be
/// removed) mid-dispatch. A panicking listener is logged and skipped.
#[derive(Default)]
pub struct WsEventBus {
    next_id: u64,
    listeners: HashMap<WsEventKind, Vec<Registration>>,
}

impl WsEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: WsEventKind, listener: WsListener) -> WsListenerId {
        self.register(kind, listener, false)
    }

    /// Listener is removed after its first delivery.
    pub fn once(&mut self, kind: WsEventKind, listener: WsListener) -> WsListenerId {
        self.register(kind, listener, true)
    }

    pub fn off(&mut self, kind: WsEventKind, id: WsListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(&kind);
        }
        removed
    }

    pub fn emit(&mut self, event: &WsEvent) {
        let kind = event.kind();
        let snapshot = match self.listeners.get_mut(&kind) {
            Some(entries) => {
                let snapshot = entries.clone();
                entries.retain(|entry| !entry.once);
                if entries.is_empty() {
                    self.listeners.remove(&kind);
                }
                snapshot
            }
            None => return,
        };

        for entry in snapshot {
            let listener = entry.listener;
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(event = kind.as_str(), listener = entry.id.0, "websocket event listener panicked");
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self, kind: WsEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    fn register(&mut self, kind: WsEventKind, listener: WsListener, once: bool) -> WsListenerId {
        self.next_id += 1;
        let id = WsListenerId(self.next_id);
        self.listeners.entry(kind).or_default().push(Registration {
            id,
            once,
            listener,
        });
        id
    }
}

impl std::fmt::Debug for WsEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&'static str, usize> = self
            .listeners
            .iter()
            .map(|(kind, entries)| (kind.as_str(), entries.len()))
            .collect();
        f.debug_struct("WsEventBus").field("listeners", &counts).finish()
    }
}
