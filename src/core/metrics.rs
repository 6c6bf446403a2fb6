use hdrhistogram::Histogram;
use std::time::{Duration, Instant, SystemTime};

use super::circular_buffer::CircularBuffer;

const LATENCY_WINDOW: usize = 10;

/// Read-only connection metrics snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct WsConnectionMetrics {
    pub connected_at: Option<SystemTime>,
    pub disconnected_at: Option<SystemTime>,
    pub uptime: Duration,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_attempts: u64,
    pub reconnect_successes: u64,
    pub errors: u64,
    pub queue_size: usize,
    pub current_reconnect_delay: Duration,
    pub average_latency: Option<Duration>,
    pub last_latency: Option<Duration>,
    pub p99_latency: Option<Duration>,
    pub latency_samples: u64,
}

/// Passive counter/gauge store fed by the connection actor.
///
/// Queue size and reconnect delay are not stored here; they are passed in at read time
/// so the snapshot always reflects the live components.
#[derive(Debug)]
pub struct WsMetricsRecorder {
    connected_at: Option<SystemTime>,
    connected_since: Option<Instant>,
    disconnected_at: Option<SystemTime>,
    messages_sent: u64,
    messages_received: u64,
    reconnect_attempts: u64,
    reconnect_successes: u64,
    errors: u64,
    latency_window: CircularBuffer<Duration>,
    latency_histogram: Histogram<u64>,
}

impl Default for WsMetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl WsMetricsRecorder {
    pub fn new() -> Self {
        Self {
            connected_at: None,
            connected_since: None,
            disconnected_at: None,
            messages_sent: 0,
            messages_received: 0,
            reconnect_attempts: 0,
            reconnect_successes: 0,
            errors: 0,
            latency_window: CircularBuffer::new(LATENCY_WINDOW),
            // 1us..60s at 3 significant figures.
            latency_histogram: Histogram::new_with_bounds(1, 60_000_000, 3)
                .expect("histogram bounds are valid"),
        }
    }

    pub fn record_connect(&mut self) {
        self.connected_at = Some(SystemTime::now());
        self.connected_since = Some(Instant::now());
    }

    pub fn record_disconnect(&mut self) {
        self.disconnected_at = Some(SystemTime::now());
        self.connected_since = None;
    }

    pub fn record_message_sent(&mut self) {
        self.messages_sent = self.messages_sent.saturating_add(1);
    }

    pub fn record_message_received(&mut self) {
        self.messages_received = self.messages_received.saturating_add(1);
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    pub fn record_reconnect_attempt(&mut self) {
        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
    }

    pub fn record_reconnect_success(&mut self) {
        self.reconnect_successes = self.reconnect_successes.saturating_add(1);
    }

    pub fn record_latency(&mut self, latency: Duration) {
        self.latency_window.push(latency);
        let micros = latency.as_micros().clamp(1, u64::MAX as u128) as u64;
        self.latency_histogram.saturating_record(micros);
    }

    pub fn average_latency(&self) -> Option<Duration> {
        if self.latency_window.is_empty() {
            return None;
        }
        let total: Duration = self.latency_window.iter().sum();
        Some(total / self.latency_window.len() as u32)
    }

    pub fn last_latency(&self) -> Option<Duration> {
        self.latency_window.back().copied()
    }

    pub fn snapshot(&self, queue_size: usize, current_reconnect_delay: Duration) -> WsConnectionMetrics {
        let latency_samples = self.latency_histogram.len();
        let p99_latency = (latency_samples > 0).then(|| {
            Duration::from_micros(self.latency_histogram.value_at_percentile(99.0))
        });

        WsConnectionMetrics {
            connected_at: self.connected_at,
            disconnected_at: self.disconnected_at,
            uptime: self
                .connected_since
                .map(|since| since.elapsed())
                .unwrap_or_default(),
            messages_sent: self.messages_sent,
            messages_received: self.messages_received,
            reconnect_attempts: self.reconnect_attempts,
            reconnect_successes: self.reconnect_successes,
            errors: self.errors,
            queue_size,
            current_reconnect_delay,
            average_latency: self.average_latency(),
            last_latency: self.last_latency(),
            p99_latency,
            latency_samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_window_keeps_last_ten_samples() {
        let mut metrics = WsMetricsRecorder::new();
        assert_eq!(metrics.average_latency(), None);
        assert_eq!(metrics.last_latency(), None);

        // 1..=12ms: only 3..=12 remain in the window.
        for ms in 1..=12 {
            metrics.record_latency(Duration::from_millis(ms));
        }

        assert_eq!(metrics.last_latency(), Some(Duration::from_millis(12)));
        assert_eq!(
            metrics.average_latency(),
            Some(Duration::from_micros(7_500))
        );

        let snapshot = metrics.snapshot(0, Duration::ZERO);
        assert_eq!(snapshot.latency_samples, 12);
        assert!(snapshot.p99_latency.unwrap() >= Duration::from_millis(11));
    }

    #[test]
    fn counters_and_live_fields_compose_into_snapshot() {
        let mut metrics = WsMetricsRecorder::new();
        metrics.record_connect();
        metrics.record_message_sent();
        metrics.record_message_sent();
        metrics.record_message_received();
        metrics.record_error();
        metrics.record_reconnect_attempt();
        metrics.record_reconnect_success();

        let snapshot = metrics.snapshot(5, Duration::from_millis(1500));
        assert!(snapshot.connected_at.is_some());
        assert_eq!(snapshot.disconnected_at, None);
        assert_eq!(snapshot.messages_sent, 2);
        assert_eq!(snapshot.messages_received, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.reconnect_attempts, 1);
        assert_eq!(snapshot.reconnect_successes, 1);
        assert_eq!(snapshot.queue_size, 5);
        assert_eq!(snapshot.current_reconnect_delay, Duration::from_millis(1500));
        assert_eq!(snapshot.p99_latency, None);

        metrics.record_disconnect();
        let snapshot = metrics.snapshot(0, Duration::ZERO);
        assert!(snapshot.disconnected_at.is_some());
        assert_eq!(snapshot.uptime, Duration::ZERO);
    }
}
