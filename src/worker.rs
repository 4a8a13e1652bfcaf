use super::{
    completion::Completion,
    errors::SubmitError,
    model::{HandlerFailure, Job, Lifecycle, WorkerStats},
    result::SubmitResult,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU8, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use crossbeam::{
    channel::{self, Receiver, SendTimeoutError, Sender, TrySendError},
    utils::CachePadded,
};
use tracing::{debug, error};

pub(crate) type Handler<P> = Arc<dyn Fn(&str, P) + Send + Sync + 'static>;
pub(crate) type FailureHook = Arc<dyn Fn(HandlerFailure) + Send + Sync + 'static>;

/// How long a submission may wait for queue capacity.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Backpressure {
    Block,
    Reject,
    Deadline(Duration),
}

#[derive(Debug)]
struct Shared {
    submitted: CachePadded<AtomicUsize>,
    done: CachePadded<AtomicUsize>,
    failed: AtomicUsize,
    state: AtomicU8,
}

impl Shared {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    fn advance(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// One processing thread draining one bounded queue, in order.
pub(crate) struct Worker<P> {
    id: usize,
    // `None` once stopped; checked under the lock on every submission.
    sender: RwLock<Option<Sender<Job<P>>>>,
    receiver: Receiver<Job<P>>,
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl<P: Send + 'static> Worker<P> {
    /// Creates the queue and starts the processing thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread.
    pub fn spawn(
        id: usize,
        capacity: usize,
        thread_name: &str,
        handler: Handler<P>,
        on_failure: FailureHook,
        completion: Arc<Completion>,
    ) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        let shared = Arc::new(Shared {
            submitted: CachePadded::new(AtomicUsize::new(0)),
            done: CachePadded::new(AtomicUsize::new(0)),
            failed: AtomicUsize::new(0),
            state: AtomicU8::new(Lifecycle::Created as u8),
        });

        let thread = {
            let rx = rx.clone();
            let shared = shared.clone();
            thread::Builder::new()
                .name(format!("{thread_name}-{id}"))
                .spawn(move || run(id, rx, handler, on_failure, shared, completion))
                .expect("failed to spawn worker thread")
        };
        shared.advance(Lifecycle::Created, Lifecycle::Running);

        Self {
            id,
            sender: RwLock::new(Some(tx)),
            receiver: rx,
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Enqueues `job`. Counters are raised before the send so `done` can
    /// never overtake `submitted`, and rolled back if the send is refused.
    pub fn send(&self, job: Job<P>, completion: &Completion, mode: Backpressure) -> SubmitResult<P> {
        // Clone out of the lock; a blocked send must not hold up `stop`.
        let tx = self
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(tx) = tx else {
            return Err(SubmitError::Closed(job));
        };

        self.shared.submitted.fetch_add(1, Ordering::AcqRel);
        completion.begin();

        let sent = match mode {
            Backpressure::Block => tx.send(job).map_err(|e| SubmitError::Closed(e.into_inner())),
            Backpressure::Reject => tx.try_send(job).map_err(|e| match e {
                TrySendError::Full(job) => SubmitError::Full(job),
                TrySendError::Disconnected(job) => SubmitError::Closed(job),
            }),
            Backpressure::Deadline(timeout) => tx.send_timeout(job, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(job) => SubmitError::Timeout(job),
                SendTimeoutError::Disconnected(job) => SubmitError::Closed(job),
            }),
        };

        if sent.is_err() {
            self.shared.submitted.fetch_sub(1, Ordering::AcqRel);
            completion.finish();
        }
        sent
    }
}

impl<P> Worker<P> {
    /// Stops accepting jobs. Already queued jobs are still processed.
    /// Returns `false` if the worker was already stopping.
    pub fn close(&self) -> bool {
        let mut sender = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        if sender.is_none() {
            return false;
        }
        self.shared.advance(Lifecycle::Running, Lifecycle::Stopping);
        // Submitters still holding a clone finish their send first; the
        // thread exits once every sender is gone and the queue is empty.
        drop(sender.take());
        true
    }

    /// Waits for the processing thread to exit. Must follow `close`.
    pub fn join(&self) {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Called from our own handler; the thread exits after it returns.
            return;
        }
        if handle.join().is_err() {
            error!(worker = self.id, "worker thread terminated abnormally");
        }
    }

    #[inline]
    pub fn submitted(&self) -> usize {
        self.shared.submitted.load(Ordering::Acquire)
    }

    #[inline]
    pub fn done(&self) -> usize {
        self.shared.done.load(Ordering::Acquire)
    }

    #[inline]
    pub fn failed(&self) -> usize {
        self.shared.failed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle()
    }

    pub fn stats(&self) -> WorkerStats {
        // `done` first so the pair never reads as done > submitted.
        let done = self.done();
        WorkerStats {
            id: self.id,
            submitted: self.submitted(),
            done,
            failed: self.failed(),
            queued: self.queued(),
            lifecycle: self.lifecycle(),
        }
    }
}

fn run<P>(
    id: usize,
    rx: Receiver<Job<P>>,
    handler: Handler<P>,
    on_failure: FailureHook,
    shared: Arc<Shared>,
    completion: Arc<Completion>,
) {
    debug!(worker = id, "worker started");

    // Drains whatever is buffered after the last sender is dropped.
    while let Ok(Job { key, payload }) = rx.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&key, payload)));

        if let Err(panic) = outcome {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            let failure = HandlerFailure {
                worker: id,
                key,
                message: panic_message(panic.as_ref()),
            };
            error!(worker = id, key = %failure.key, message = %failure.message, "handler panicked");

            if panic::catch_unwind(AssertUnwindSafe(|| on_failure(failure))).is_err() {
                error!(worker = id, "failure hook panicked");
            }
        }

        shared.done.fetch_add(1, Ordering::AcqRel);
        completion.finish();
    }

    shared.state.store(Lifecycle::Stopped as u8, Ordering::Release);
    debug!(worker = id, "worker stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
