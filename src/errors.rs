use std::fmt;

use thiserror::Error;

use crate::model::Job;

/// Invalid construction parameters. Reported before any worker thread starts.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("queue capacity must be at least 2, got {0}")]
    QueueTooSmall(usize),

    #[error("group `{0}` is already registered")]
    DuplicateGroup(String),
}

/// A rejected submission. The job is handed back to the caller.
#[derive(Error, PartialEq, Eq)]
pub enum SubmitError<P> {
    #[error("executor is stopped")]
    Closed(Job<P>),

    #[error("worker queue is full")]
    Full(Job<P>),

    #[error("timed out waiting for queue capacity")]
    Timeout(Job<P>),
}

impl<P> SubmitError<P> {
    pub fn into_job(self) -> Job<P> {
        match self {
            Self::Closed(job) | Self::Full(job) | Self::Timeout(job) => job,
        }
    }

    pub fn job(&self) -> &Job<P> {
        match self {
            Self::Closed(job) | Self::Full(job) | Self::Timeout(job) => job,
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

// Payloads are opaque, so only the key is printed.
impl<P> fmt::Debug for SubmitError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed(_) => "Closed",
            Self::Full(_) => "Full",
            Self::Timeout(_) => "Timeout",
        };
        f.debug_tuple(name).field(&self.job().key).finish()
    }
}
