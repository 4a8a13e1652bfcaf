//! Outstanding-job tracking shared between submitters, workers and waiters.
//!
//! Workers signal after every finished job; waiters are woken the moment the
//! outstanding count reaches zero instead of polling the counters.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Condvar, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct Completion {
    outstanding: AtomicUsize,
    lock: Mutex<()>,
    cond: Condvar,
    notify: Notify,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Registers a job about to be enqueued.
    #[inline]
    pub fn begin(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Marks one job finished, or an enqueue that was rolled back.
    pub fn finish(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Taking the lock orders this wake-up after a waiter's check.
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.cond.notify_all();
            self.notify.notify_waiters();
        }
    }

    pub fn wait(&self) {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.outstanding() > 0 {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns `false` if jobs were still outstanding at the deadline.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.outstanding() > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .cond
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    pub async fn wait_async(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `finish` cannot slip by.
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}
