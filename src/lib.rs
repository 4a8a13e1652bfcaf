//! Key-partitioned job executor.
//!
//! # Features
//! - Fixed pool of worker threads, one bounded queue per worker
//! - Stable key routing: jobs sharing a key run in submission order
//! - Blocking, non-blocking and deadline-bounded submission
//! - Graceful stop that drains queued jobs
//! - Panic isolation with a failure hook
//! - Completion waiting without polling, blocking or async
//! - Named groups with isolated backpressure domains

pub mod config;
pub mod errors;
pub mod executor;
pub mod group;
pub mod model;
pub mod result;
pub mod routing;

mod completion;
mod worker;

pub use config::Config;
pub use errors::{ConfigError, SubmitError};
pub use executor::Executor;
pub use group::{Group, GroupManager};
pub use model::{ExecutorMetrics, HandlerFailure, Job, Lifecycle, WorkerStats};
