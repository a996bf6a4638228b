//! Progress handle implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Callback fired whenever the completed fraction changes
pub type ProgressListener = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Point-in-time view of a progress handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Units of work expected so far
    pub total: u64,
    /// Units of work finished (never exceeds `total`)
    pub done: u64,
    /// Pages decoded and handed to the callback
    pub pages: u64,
    /// `done / total`, or 0 when nothing is expected yet
    pub fraction: f32,
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    done: u64,
    pages: u64,
    last_dispatch: Option<f32>,
}

impl Counters {
    fn snapshot(&self) -> ProgressSnapshot {
        let fraction = if self.total == 0 {
            0.0
        } else {
            self.done as f32 / self.total as f32
        };
        ProgressSnapshot {
            total: self.total,
            done: self.done,
            pages: self.pages,
            fraction,
        }
    }
}

#[derive(Default)]
struct Inner {
    counters: Mutex<Counters>,
    listeners: Mutex<Vec<ProgressListener>>,
    cancelled: AtomicBool,
    notify: Notify,
}

/// Request-scoped progress and cancellation token.
///
/// Cloning shares the same underlying state; a fresh handle should be created
/// per logical request unless progress is meant to be aggregated.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

impl Progress {
    /// Create a new handle with no work and no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener fired whenever the completed fraction changes
    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        lock(&self.inner.listeners).push(Arc::new(listener));
    }

    /// Replace the expected amount of work
    pub fn set_work(&self, total: u64) {
        self.update(|c| {
            c.total = total;
            c.done = c.done.min(total);
        });
    }

    /// Expect more units of work
    pub fn add_work(&self, units: u64) {
        self.update(|c| c.total = c.total.saturating_add(units));
    }

    /// Finish units of work, clamped to the expected total
    pub fn finish(&self, units: u64) {
        self.update(|c| c.done = c.done.saturating_add(units).min(c.total));
    }

    /// Record one decoded page and finish its unit of work
    pub fn page_completed(&self) {
        self.update(|c| {
            c.pages += 1;
            c.done = c.done.saturating_add(1).min(c.total);
        });
    }

    /// Current state of the handle
    pub fn snapshot(&self) -> ProgressSnapshot {
        lock(&self.inner.counters).snapshot()
    }

    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        self.snapshot().fraction
    }

    /// Number of pages completed
    pub fn pages_completed(&self) -> u64 {
        self.snapshot().pages
    }

    /// Signal cancellation to every request holding this handle
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation is signalled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    fn update(&self, change: impl FnOnce(&mut Counters)) {
        let snapshot = {
            let mut counters = lock(&self.inner.counters);
            change(&mut counters);
            let snapshot = counters.snapshot();
            if counters.last_dispatch == Some(snapshot.fraction) {
                return;
            }
            counters.last_dispatch = Some(snapshot.fraction);
            snapshot
        };

        // Listeners run without the lock held and may use the handle.
        let listeners = lock(&self.inner.listeners).clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("snapshot", &self.snapshot())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
