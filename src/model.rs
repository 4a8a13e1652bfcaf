use std::fmt;

/// One unit of work: a routing key and an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job<P> {
    pub key: String,
    pub payload: P,
}

impl<P> Job<P> {
    pub fn new(key: impl Into<String>, payload: P) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

/// Worker/executor lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Lifecycle {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl Lifecycle {
    #[inline]
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A panic caught while a handler processed one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub worker: usize,
    pub key: String,
    pub message: String,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "handler panicked on worker {} (key `{}`): {}",
            self.worker, self.key, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    pub submitted: usize,
    pub done: usize,
    pub failed: usize,
    pub queued: usize,
    pub lifecycle: Lifecycle,
}

/// Point-in-time aggregate over all workers of one executor.
///
/// Counters are read one after another without a global lock, so the
/// values may be slightly stale relative to each other.
#[derive(Debug, Clone)]
pub struct ExecutorMetrics {
    pub workers: usize,
    pub submitted: usize,
    pub done: usize,
    pub failed: usize,
    pub queued: usize,
}

impl ExecutorMetrics {
    pub fn pending(&self) -> usize {
        self.submitted.saturating_sub(self.done)
    }

    pub fn success_rate(&self) -> f64 {
        if self.done == 0 {
            return 1.0;
        }
        (self.done - self.failed.min(self.done)) as f64 / self.done as f64
    }
}
