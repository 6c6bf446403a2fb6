//! Cancelable timers.
//!
//! Every timer a component arms is a `WsScheduledTask` stored in an `Option` on that
//! component. Dropping the task aborts it, so clearing the field is the cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Callback injected into timer-driven components. Each invocation yields the work to run
/// when the timer fires (typically telling the owning actor about it).
pub type WsTimerCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Build a [`WsTimerCallback`] from a closure returning a future.
pub fn timer_callback<F, Fut>(f: F) -> WsTimerCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Handle to a spawned timer task; aborts the task when canceled or dropped.
#[derive(Debug)]
pub struct WsScheduledTask {
    handle: JoinHandle<()>,
}

impl WsScheduledTask {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Run `future` once after `delay`.
    pub fn after<F>(delay: Duration, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            future.await;
        })
    }

    /// Invoke `callback` every `period`, first tick one full period from now.
    pub fn every(period: Duration, callback: WsTimerCallback) -> Self {
        Self::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback().await;
            }
        })
    }

    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for WsScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn after_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _task = WsScheduledTask::after(Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_task_cancels_it() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let task = WsScheduledTask::after(Duration::from_millis(50), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(task);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn every_ticks_after_each_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = WsScheduledTask::every(
            Duration::from_millis(100),
            timer_callback(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        task.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
