use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Quiet period used for dashboard resize bursts.
pub const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Runs an action once a burst of triggers has gone quiet.
///
/// Every `trigger` re-arms the timer, so only the last action of a burst
/// runs. Dropping the debouncer clears the pending timer.
pub struct Debouncer {
    quiet: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn for_resize() -> Self {
        Self::new(RESIZE_QUIET_PERIOD)
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn trigger<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let generation = self.generation.clone();
        let quiet = self.quiet;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if generation.load(Ordering::SeqCst) == armed {
                action();
            }
        }));
    }

    /// Clears the pending timer, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = pending.take() {
            timer.abort();
            tracing::debug!("Debounced action cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_action_once() {
        let debouncer = Debouncer::for_resize();
        let fired = Arc::new(Mutex::new(Vec::new()));

        for width in [800, 900, 1024] {
            let fired = fired.clone();
            debouncer.trigger(move || fired.lock().unwrap().push(width));
            sleep(Duration::from_millis(150)).await;
        }
        assert!(fired.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(*fired.lock().unwrap(), vec![1024]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = count.clone();
            debouncer.trigger(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
            sleep(Duration::from_millis(60)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_clear_pending_timer() {
        let count = Arc::new(AtomicUsize::new(0));

        let debouncer = Debouncer::for_resize();
        let c = count.clone();
        debouncer.trigger(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        let c = count.clone();
        debouncer.trigger(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        drop(debouncer);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
