use super::{
    completion::Completion,
    config::Config,
    errors::ConfigError,
    model::{ExecutorMetrics, HandlerFailure, Job, Lifecycle, WorkerStats},
    result::SubmitResult,
    routing,
    worker::{Backpressure, FailureHook, Handler, Worker},
};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Fixed pool of worker threads with key-affine routing.
///
/// Every job is routed by hashing its key, so all jobs sharing a key run on
/// the same worker in submission order, while different keys may run in
/// parallel. Each worker owns a bounded queue; `submit` blocks while the
/// routed queue is full, which is the only backpressure mechanism.
///
/// The handler is shared by all workers and is called concurrently with
/// distinct jobs. A panicking handler is isolated: the failure is logged and
/// passed to the failure hook, the job counts as done and the worker moves on.
///
/// # Liveness
///
/// [`wait_all`](Self::wait_all) returns only once every submitted job has
/// finished. A handler that never returns stalls it forever, and so does
/// calling it from inside a handler; the executor cannot detect either.
pub struct Executor<P> {
    workers: Vec<Worker<P>>,
    completion: Arc<Completion>,
    config: Config,
}

impl<P: Send + 'static> Executor<P> {
    pub fn new<F>(num_workers: usize, queue_capacity: usize, handler: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        Self::with_config(Config::new(num_workers, queue_capacity), handler)
    }

    pub fn with_config<F>(config: Config, handler: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        Self::with_failure_hook(config, handler, |_| {})
    }

    /// Like [`with_config`](Self::with_config), additionally reporting every
    /// caught handler panic to `on_failure` (called on the worker thread).
    pub fn with_failure_hook<F, H>(config: Config, handler: F, on_failure: H) -> Result<Self, ConfigError>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
        H: Fn(HandlerFailure) + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self::start(config, Arc::new(handler), Arc::new(on_failure)))
    }

    /// Starts the workers of an already validated config.
    pub(crate) fn start(config: Config, handler: Handler<P>, on_failure: FailureHook) -> Self {
        debug_assert!(config.validate().is_ok());

        let completion = Arc::new(Completion::new());
        let workers = (0..config.num_workers)
            .map(|id| {
                Worker::spawn(
                    id,
                    config.queue_capacity,
                    &config.thread_name,
                    handler.clone(),
                    on_failure.clone(),
                    completion.clone(),
                )
            })
            .collect();

        debug!(
            workers = config.num_workers,
            queue_capacity = config.queue_capacity,
            name = %config.thread_name,
            "executor started"
        );

        Self {
            workers,
            completion,
            config,
        }
    }

    /// Enqueues a job, blocking while the routed worker's queue is full.
    ///
    /// Fails with [`SubmitError::Closed`](crate::errors::SubmitError::Closed)
    /// after [`stop`](Self::stop), handing the job back.
    pub fn submit(&self, key: impl Into<String>, payload: P) -> SubmitResult<P> {
        self.dispatch(Job::new(key, payload), Backpressure::Block)
    }

    /// Enqueues a job without blocking; fails with `Full` if the routed queue
    /// has no free slot.
    pub fn try_submit(&self, key: impl Into<String>, payload: P) -> SubmitResult<P> {
        self.dispatch(Job::new(key, payload), Backpressure::Reject)
    }

    /// Enqueues a job, waiting at most `timeout` for queue capacity.
    pub fn submit_timeout(&self, key: impl Into<String>, payload: P, timeout: Duration) -> SubmitResult<P> {
        self.dispatch(Job::new(key, payload), Backpressure::Deadline(timeout))
    }

    pub fn submit_job(&self, job: Job<P>) -> SubmitResult<P> {
        self.dispatch(job, Backpressure::Block)
    }

    fn dispatch(&self, job: Job<P>, mode: Backpressure) -> SubmitResult<P> {
        let worker = &self.workers[self.worker_for(&job.key)];
        let result = worker.send(job, &self.completion, mode);
        if let Err(e) = &result {
            if e.is_closed() {
                warn!(key = %e.job().key, "submission rejected: executor is stopped");
            }
        }
        result
    }

    /// Signals every worker to stop accepting jobs. Queued jobs are still
    /// processed; this does not wait for them. Idempotent.
    pub fn stop(&self) {
        let closed = self.workers.iter().filter(|w| w.close()).count();
        if closed > 0 {
            info!(name = %self.config.thread_name, "executor stopping");
        }
    }

    /// Stops the executor and waits for every worker to drain its queue and
    /// exit.
    pub fn shutdown(&self) {
        self.stop();
        for worker in &self.workers {
            worker.join();
        }
    }

    /// Blocks until every submitted job has finished.
    pub fn wait_all(&self) {
        self.completion.wait();
    }

    /// Returns `false` if jobs were still pending when `timeout` elapsed.
    pub fn wait_all_timeout(&self, timeout: Duration) -> bool {
        self.completion.wait_timeout(timeout)
    }

    pub async fn wait_all_async(&self) {
        self.completion.wait_async().await;
    }
}

impl<P> Executor<P> {
    /// Worker index that `key` is routed to.
    #[inline]
    pub fn worker_for(&self, key: &str) -> usize {
        routing::route(key, self.workers.len())
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `Running` until `stop`, `Stopped` once every worker has exited,
    /// `Stopping` in between.
    pub fn lifecycle(&self) -> Lifecycle {
        self.workers
            .iter()
            .map(|w| w.lifecycle())
            .min()
            .unwrap_or(Lifecycle::Stopped)
    }

    /// Done count per worker index. Not synchronized with concurrent
    /// submissions.
    pub fn snapshot_counts(&self) -> BTreeMap<usize, usize> {
        self.workers
            .iter()
            .enumerate()
            .map(|(i, w)| (i, w.done()))
            .collect()
    }

    /// `(submitted, done)` across all workers.
    pub fn total_counts(&self) -> (usize, usize) {
        let done: usize = self.workers.iter().map(|w| w.done()).sum();
        let submitted = self.workers.iter().map(|w| w.submitted()).sum();
        (submitted, done)
    }

    pub fn worker_stats(&self) -> Vec<WorkerStats> {
        self.workers.iter().map(|w| w.stats()).collect()
    }

    pub fn metrics(&self) -> ExecutorMetrics {
        let (submitted, done) = self.total_counts();
        ExecutorMetrics {
            workers: self.workers.len(),
            submitted,
            done,
            failed: self.workers.iter().map(|w| w.failed()).sum(),
            queued: self.workers.iter().map(|w| w.queued()).sum(),
        }
    }
}

impl<P> Drop for Executor<P> {
    fn drop(&mut self) {
        // Threads finish their queues in the background.
        for worker in &self.workers {
            worker.close();
        }
    }
}
