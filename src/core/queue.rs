use std::time::SystemTime;

use super::circular_buffer::CircularBuffer;
use super::payload::{OpaqueCommand, WsSendCallbacks};

/// Outbound command held while the connection is down.
#[derive(Debug)]
pub struct WsQueuedMessage {
    pub payload: OpaqueCommand,
    pub enqueued_at: SystemTime,
    pub callbacks: WsSendCallbacks,
}

/// Result of [`WsMessageQueue::enqueue`].
#[derive(Debug)]
pub enum WsEnqueueOutcome {
    Queued,
    /// Queue was full; the oldest entry was dropped to admit the new one.
    Evicted(WsQueuedMessage),
    /// Queue cannot hold anything (capacity 0); the message is handed back.
    Rejected(WsQueuedMessage),
}

/// Bounded FIFO of outbound commands with keep-most-recent eviction.
#[derive(Debug)]
pub struct WsMessageQueue {
    entries: CircularBuffer<WsQueuedMessage>,
}

impl WsMessageQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: CircularBuffer::new(capacity),
        }
    }

    pub fn enqueue(&mut self, payload: OpaqueCommand, callbacks: WsSendCallbacks) -> WsEnqueueOutcome {
        let message = WsQueuedMessage {
            payload,
            enqueued_at: SystemTime::now(),
            callbacks,
        };
        if self.entries.capacity() == 0 {
            return WsEnqueueOutcome::Rejected(message);
        }
        match self.entries.push(message) {
            Some(oldest) => WsEnqueueOutcome::Evicted(oldest),
            None => WsEnqueueOutcome::Queued,
        }
    }

    /// Drain every entry in enqueue order. Redelivery is the caller's job.
    pub fn flush(&mut self) -> Vec<WsQueuedMessage> {
        self.entries.drain()
    }

    /// Drop every entry without running its callbacks. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}
