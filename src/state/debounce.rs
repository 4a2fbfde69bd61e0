//! Trailing-edge debouncer over tokio timers.
//!
//! Each `schedule` replaces the pending task; only the last one scheduled within
//! the quiet period runs. A zero delay, or no runtime on the calling thread,
//! runs the task inline.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

type Task = Box<dyn FnOnce() + Send + 'static>;
type Slot = Arc<Mutex<Option<Task>>>;

struct Pending {
    slot: Slot,
    handle: JoinHandle<()>,
}

/// Coalesces bursts of calls into a single trailing invocation.
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    /// Debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, cancelling whatever was pending.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        if self.delay.is_zero() {
            task();
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                trace!("No tokio runtime; running debounced task inline");
                task();
                return;
            }
        };

        let slot: Slot = Arc::new(Mutex::new(Some(Box::new(task))));
        let delay = self.delay;
        let timer_slot = Arc::clone(&slot);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(task) = take(&timer_slot) {
                task();
            }
        });

        self.pending = Some(Pending { slot, handle });
    }

    /// Run the pending task now instead of waiting. Returns whether one ran.
    pub fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        pending.handle.abort();
        match take(&pending.slot) {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Drop the pending task without running it. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        pending.handle.abort();
        take(&pending.slot).is_some()
    }

    /// Whether a task is waiting for its quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pending| {
            pending
                .slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        })
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn take(slot: &Slot) -> Option<Task> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || -> Box<dyn FnOnce() + Send> {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
            }
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_runs_only_the_trailing_task() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        for _ in 0..5 {
            debouncer.schedule(make());
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0, "still inside quiet period");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_task() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.schedule(make());
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_runs_pending_task_immediately_once() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.schedule(make());
        assert!(debouncer.flush());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1, "timer must not fire again");
        assert!(!debouncer.flush());
    }

    #[test]
    fn zero_delay_runs_inline() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.schedule(make());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_runtime_runs_inline() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule(make());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
