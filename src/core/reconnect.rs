use std::future::Future;
use std::time::Duration;

use super::timer::WsScheduledTask;

/// Deterministic exponential backoff, capped at `max`. No jitter.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffReconnect {
    base: Duration,
    max: Duration,
    factor: f64,
    current: Duration,
}

impl ExponentialBackoffReconnect {
    pub fn new(base: Duration, max: Duration, factor: f64) -> Self {
        let factor = if factor.is_finite() && factor >= 1.0 {
            factor
        } else {
            1.5
        };
        Self {
            base,
            max,
            factor,
            current: base,
        }
    }

    /// Delay for the attempt being scheduled now; grows the delay for the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        let next = (self.current.as_nanos() as f64 * self.factor)
            .round()
            .min(self.max.as_nanos() as f64);
        self.current = Duration::from_nanos(next as u64);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }

    /// Delay the next `next_delay` call will return.
    pub fn current_delay(&self) -> Duration {
        self.current.min(self.max)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for ExponentialBackoffReconnect {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 1.5)
    }
}

/// Outcome of [`WsReconnectionManager::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WsReconnectSchedule {
    Scheduled {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
    /// Attempt budget spent; nothing was armed.
    Exhausted { attempts: u32 },
}

/// Drives automatic retries: counts attempts, computes the backoff and owns the pending timer.
#[derive(Debug)]
pub struct WsReconnectionManager {
    backoff: ExponentialBackoffReconnect,
    max_attempts: u32,
    attempt_count: u32,
    pending: Option<WsScheduledTask>,
}

impl WsReconnectionManager {
    pub fn new(backoff: ExponentialBackoffReconnect, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts,
            attempt_count: 0,
            pending: None,
        }
    }

    /// Arm the next attempt; `reconnect` runs when the backoff delay elapses.
    ///
    /// Replaces any timer that is still pending.
    pub fn schedule<F>(&mut self, reconnect: F) -> WsReconnectSchedule
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.attempt_count >= self.max_attempts {
            return WsReconnectSchedule::Exhausted {
                attempts: self.attempt_count,
            };
        }

        self.attempt_count += 1;
        let delay = self.backoff.next_delay();
        self.pending = Some(WsScheduledTask::after(delay, reconnect));

        WsReconnectSchedule::Scheduled {
            attempt: self.attempt_count,
            max_attempts: self.max_attempts,
            delay,
        }
    }

    /// Called on a successful connection.
    pub fn reset(&mut self) {
        self.attempt_count = 0;
        self.backoff.reset();
        self.pending = None;
    }

    /// Drop the pending timer, keeping attempt count and delay.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn current_delay(&self) -> Duration {
        self.backoff.current_delay()
    }
}
