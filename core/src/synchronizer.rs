//! Periodic refresh of a `RemoteData`.
//!
//! # Design
//! A running synchronizer owns one tokio task that ticks every `interval`
//! and calls `RemoteData::update` on each tick without waiting for it. The
//! first tick happens one interval after `start`. Stopping aborts the ticking
//! task only; updates it already launched still complete and publish.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::error::ApiError;
use crate::remote::RemoteData;

pub struct Synchronizer<T> {
    data: RemoteData<T>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl<T> Synchronizer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a stopped synchronizer. `interval` must be non-zero.
    pub fn new(data: RemoteData<T>, interval: Duration) -> Result<Self, ApiError> {
        if interval.is_zero() {
            return Err(ApiError::InvalidInterval);
        }
        Ok(Self {
            data,
            interval,
            task: None,
        })
    }

    pub fn data(&self) -> &RemoteData<T> {
        &self.data
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin polling. Restarts the timer if already running.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self) {
        self.abort();

        let data = self.data.clone();
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = data.update();
            }
        }));
        debug!(interval_ms = period.as_millis() as u64, "synchronizer started");
    }

    /// Stop polling. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.abort() {
            debug!("synchronizer stopped");
        }
    }

    pub fn is_in_synch(&self) -> bool {
        self.task.is_some()
    }
}

impl<T> Synchronizer<T> {
    fn abort(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl<T> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::time::sleep;

    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    /// Remote data whose fetch counts its calls and returns the call number.
    fn counting_data() -> (RemoteData<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let data = RemoteData::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, ApiError>(n) }
        });
        (data, calls)
    }

    #[test]
    fn zero_interval_is_rejected() {
        let (data, _) = counting_data();
        let err = Synchronizer::new(data, Duration::ZERO).err().unwrap();
        assert!(matches!(err, ApiError::InvalidInterval));
    }

    #[tokio::test(start_paused = true)]
    async fn is_not_started_by_default() {
        let (data, calls) = counting_data();
        let sync = Synchronizer::new(data, PERIOD).unwrap();

        sleep(PERIOD * 3).await;

        assert!(!sync.is_in_synch());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_toggle_state() {
        let (data, _) = counting_data();
        let mut sync = Synchronizer::new(data, PERIOD).unwrap();

        sync.start();
        assert!(sync.is_in_synch());

        sync.stop();
        assert!(!sync.is_in_synch());

        sync.stop();
        assert!(!sync.is_in_synch());
    }

    #[tokio::test(start_paused = true)]
    async fn updates_once_per_interval() {
        let (data, calls) = counting_data();
        let mut sync = Synchronizer::new(data.clone(), PERIOD).unwrap();

        sync.start();
        sleep(PERIOD / 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        sleep(PERIOD * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(data.value(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn no_firings_after_stop() {
        let (data, calls) = counting_data();
        let mut sync = Synchronizer::new(data, PERIOD).unwrap();

        sync.start();
        sleep(PERIOD * 2 + PERIOD / 2).await;
        sync.stop();
        let before = calls.load(Ordering::SeqCst);

        sleep(PERIOD * 5).await;
        assert_eq!(before, 2);
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_does_not_leak_a_timer() {
        let (data, calls) = counting_data();
        let mut sync = Synchronizer::new(data, PERIOD).unwrap();

        sync.start();
        sync.start();
        sleep(PERIOD * 3 + PERIOD / 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        sync.stop();
        sleep(PERIOD * 5).await;
        assert!(!sync.is_in_synch());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_update_completes_after_stop() {
        let data = RemoteData::new(|| async {
            sleep(Duration::from_millis(50)).await;
            Ok::<_, ApiError>(42u32)
        });
        let mut sync = Synchronizer::new(data.clone(), PERIOD).unwrap();

        sync.start();
        sleep(PERIOD + Duration::from_millis(10)).await;
        sync.stop();
        assert_eq!(data.value(), None);

        sleep(PERIOD).await;
        assert_eq!(data.value(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_updates_do_not_stop_the_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let data: RemoteData<u32> = RemoteData::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::Transport("connection refused".to_string())) }
        });
        let mut sync = Synchronizer::new(data.clone(), PERIOD).unwrap();

        sync.start();
        sleep(PERIOD * 3 + PERIOD / 2).await;

        assert!(sync.is_in_synch());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(data.value(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_polling() {
        let (data, calls) = counting_data();
        let mut sync = Synchronizer::new(data, PERIOD).unwrap();

        sync.start();
        drop(sync);
        sleep(PERIOD * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_running_synchronizer_stops_polling() {
        let (data, calls) = counting_data();
        let mut sync = Synchronizer::new(data, PERIOD).unwrap();

        sync.start();
        sleep(PERIOD * 2 + PERIOD / 2).await;
        drop(sync);

        sleep(PERIOD * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
