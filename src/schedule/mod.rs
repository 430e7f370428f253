//! Debounced scheduling of recomputation.
//!
//! Callers that re-run a simulation in response to input changes should not run it on every
//! change. A [Debouncer] holds at most one pending task: scheduling a new task before the pending
//! one has fired cancels the pending one and restarts the delay. Once a task has started it runs
//! to completion, only tasks that are still waiting can be cancelled.
//!
//! Tasks are spawned onto the current tokio runtime so [Debouncer::schedule] must be called from
//! within one.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancel() {
            debug!("SCHEDULE: Replaced pending task");
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
    }

    ///Returns true if there was a task waiting to fire.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DEBOUNCE)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::{Debouncer, DEFAULT_DEBOUNCE};

    const DELAY: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_millis(150);

    #[test]
    fn test_that_default_delay_is_two_hundred_millis() {
        assert_eq!(Debouncer::new().delay(), Duration::from_millis(200));
        assert_eq!(DEFAULT_DEBOUNCE.as_millis(), 200);
    }

    #[tokio::test]
    async fn test_that_only_last_scheduled_task_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::with_delay(DELAY);

        for value in 1..=3 {
            let runs = Arc::clone(&runs);
            let last = Arc::clone(&last);
            debouncer.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(value, Ordering::SeqCst);
            });
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(WAIT).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_that_cancelled_task_never_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::with_delay(DELAY);

        let counter = Arc::clone(&runs);
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(WAIT).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_that_tasks_scheduled_after_firing_run_again() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::with_delay(DELAY);

        for _ in 0..2 {
            let counter = Arc::clone(&runs);
            debouncer.schedule(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(WAIT).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
