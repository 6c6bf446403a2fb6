use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use super::timer::{WsScheduledTask, WsTimerCallback};

/// Fired when a ping goes unanswered; receives the sequence number of that ping.
pub type WsPingTimeoutCallback = Arc<dyn Fn(u64) -> BoxFuture<'static, ()> + Send + Sync>;

/// Build a [`WsPingTimeoutCallback`] from a closure returning a future.
pub fn ping_timeout_callback<F, Fut>(f: F) -> WsPingTimeoutCallback
where
    F: Fn(u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |seq| Box::pin(f(seq)))
}

#[derive(Debug, Clone, Copy)]
struct OutstandingPing {
    seq: u64,
    sent_at: Instant,
}

/// Application-level liveness check: periodic `PING`, one-shot timeout per outstanding ping.
///
/// The manager never touches the socket. Each tick invokes the injected `on_tick` callback;
/// the owner sends the ping and reports back through [`ping_sent`](Self::ping_sent).
/// Every armed deadline carries the sequence number of its ping, and
/// [`handle_timeout`](Self::handle_timeout) only honours the one still outstanding.
pub struct WsHeartbeatManager {
    interval: Duration,
    timeout: Duration,
    next_seq: u64,
    outstanding: Option<OutstandingPing>,
    ticker: Option<WsScheduledTask>,
    pending_timeout: Option<WsScheduledTask>,
    on_timeout: Option<WsPingTimeoutCallback>,
}

impl WsHeartbeatManager {
    /// `interval == 0` disables the heartbeat.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            next_seq: 0,
            outstanding: None,
            ticker: None,
            pending_timeout: None,
            on_timeout: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Start ticking. Returns `false` (and does nothing) when disabled.
    pub fn start(&mut self, on_tick: WsTimerCallback, on_timeout: WsPingTimeoutCallback) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.stop();
        self.ticker = Some(WsScheduledTask::every(self.interval, on_tick));
        self.on_timeout = Some(on_timeout);
        true
    }

    /// Report the outcome of the ping requested by the last tick.
    ///
    /// A failed send skips the tick. While a ping is outstanding the existing deadline is
    /// kept, so liveness is measured from the oldest unanswered ping.
    pub fn ping_sent(&mut self, sent: bool) {
        if !sent || !self.is_running() || self.outstanding.is_some() {
            return;
        }
        let Some(on_timeout) = self.on_timeout.clone() else {
            return;
        };
        self.next_seq += 1;
        let seq = self.next_seq;
        self.outstanding = Some(OutstandingPing {
            seq,
            sent_at: Instant::now(),
        });
        self.pending_timeout = Some(WsScheduledTask::after(self.timeout, on_timeout(seq)));
    }

    /// Consume a `PONG`. Returns the round-trip latency when a ping was outstanding.
    pub fn handle_pong(&mut self) -> Option<Duration> {
        self.pending_timeout = None;
        self.outstanding
            .take()
            .map(|ping| Instant::now().saturating_duration_since(ping.sent_at))
    }

    /// Acknowledge a fired timeout for ping `seq`.
    ///
    /// Returns `false` when that ping was already answered or a newer ping replaced it.
    pub fn handle_timeout(&mut self, seq: u64) -> bool {
        match self.outstanding {
            Some(ping) if ping.seq == seq => {
                self.outstanding = None;
                self.pending_timeout = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel both timers and release the callbacks. Safe when not running.
    pub fn stop(&mut self) {
        self.ticker = None;
        self.pending_timeout = None;
        self.on_timeout = None;
        self.outstanding = None;
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_awaiting_pong(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Sequence number of the unanswered ping, if any.
    pub fn outstanding_seq(&self) -> Option<u64> {
        self.outstanding.map(|ping| ping.seq)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for WsHeartbeatManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsHeartbeatManager")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("running", &self.is_running())
            .field("awaiting_pong", &self.is_awaiting_pong())
            .finish()
    }
}
