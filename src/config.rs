use super::errors::ConfigError;

pub const MIN_QUEUE_CAPACITY: usize = 2;

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub num_workers: usize,
    /// Jobs buffered per worker before `submit` blocks.
    pub queue_capacity: usize,
    /// Worker threads are named `<thread_name>-<index>`.
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            queue_capacity: 64,
            thread_name: "keyed-pool".to_owned(),
        }
    }
}

impl Config {
    pub fn new(num_workers: usize, queue_capacity: usize) -> Self {
        Self {
            num_workers,
            queue_capacity,
            ..Default::default()
        }
    }

    pub fn cpu_bound() -> Self {
        Self {
            num_workers: num_cpus::get(),
            queue_capacity: 16,
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        Self {
            num_workers: num_cpus::get() * 2,
            queue_capacity: 256,
            ..Default::default()
        }
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::QueueTooSmall(self.queue_capacity));
        }
        Ok(())
    }
}
