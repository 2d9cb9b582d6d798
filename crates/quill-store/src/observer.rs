//! Exactly-once terminal callbacks for units of work.
//!
//! An `ObservedTask` wraps the observer attached to one async write. The
//! executor drives it to exactly one of three terminal states: `finished`
//! on success, `failed` on task failure, `aborted` if the task was canceled
//! before it ever ran. The one-shot guard is a single compare-and-swap, so
//! racing exit paths cannot double-fire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer of one asynchronous unit of work.
///
/// Exactly one of the three methods is invoked, exactly once, regardless of
/// how the task ends. Failures still propagate through the returned future,
/// so observer-based and future-based callers see a consistent outcome.
pub trait TaskObserver<T>: Send + Sync {
    /// The task produced a value.
    fn finished(&self, result: &T);

    /// The task (or its submission) failed. The message carries the cause.
    fn failed(&self, message: &str);

    /// The task was canceled before execution began.
    fn aborted(&self);
}

/// One-shot dispatcher guaranteeing a single terminal callback.
pub struct ObservedTask<T> {
    observer: Option<Arc<dyn TaskObserver<T>>>,
    fired: AtomicBool,
}

impl<T> ObservedTask<T> {
    #[must_use]
    pub fn new(observer: Option<Arc<dyn TaskObserver<T>>>) -> Self {
        Self {
            observer,
            fired: AtomicBool::new(false),
        }
    }

    /// An observed task with nobody watching. Terminal calls are no-ops
    /// beyond arming the one-shot flag.
    #[must_use]
    pub fn unobserved() -> Self {
        Self::new(None)
    }

    pub fn finish(&self, result: &T) {
        if self.arm() {
            if let Some(observer) = &self.observer {
                observer.finished(result);
            }
        }
    }

    pub fn error(&self, message: &str) {
        if self.arm() {
            if let Some(observer) = &self.observer {
                observer.failed(message);
            }
        }
    }

    pub fn abort(&self) {
        if self.arm() {
            if let Some(observer) = &self.observer {
                observer.aborted();
            }
        }
    }

    /// Claim the single terminal slot. Only the first caller wins.
    fn arm(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
