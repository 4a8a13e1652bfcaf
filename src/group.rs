//! Independent, named workloads under one manager.
//!
//! Each [`Group`] owns a private [`Executor`], so a group with full queues
//! never blocks submissions to another group. Groups live as long as the
//! manager (or the last `Arc` handed out) and are never recycled.

use super::{
    config::Config,
    errors::ConfigError,
    executor::Executor,
    model::{ExecutorMetrics, HandlerFailure},
    result::SubmitResult,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use futures::future;
use tracing::debug;

pub struct Group<P> {
    name: String,
    executor: Executor<P>,
}

impl<P: Send + 'static> Group<P> {
    #[inline]
    pub fn submit(&self, key: impl Into<String>, payload: P) -> SubmitResult<P> {
        self.executor.submit(key, payload)
    }

    #[inline]
    pub fn try_submit(&self, key: impl Into<String>, payload: P) -> SubmitResult<P> {
        self.executor.try_submit(key, payload)
    }

    #[inline]
    pub fn submit_timeout(&self, key: impl Into<String>, payload: P, timeout: Duration) -> SubmitResult<P> {
        self.executor.submit_timeout(key, payload, timeout)
    }

    #[inline]
    pub fn wait_all(&self) {
        self.executor.wait_all();
    }

    #[inline]
    pub fn wait_all_timeout(&self, timeout: Duration) -> bool {
        self.executor.wait_all_timeout(timeout)
    }

    pub async fn wait_all_async(&self) {
        self.executor.wait_all_async().await;
    }

    #[inline]
    pub fn stop(&self) {
        self.executor.stop();
    }
}

impl<P> Group<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_counts(&self) -> (usize, usize) {
        self.executor.total_counts()
    }

    pub fn snapshot_counts(&self) -> BTreeMap<usize, usize> {
        self.executor.snapshot_counts()
    }

    pub fn metrics(&self) -> ExecutorMetrics {
        self.executor.metrics()
    }

    pub fn executor(&self) -> &Executor<P> {
        &self.executor
    }
}

/// Registry and factory for [`Group`]s.
///
/// Groups created with [`new_group`](Self::new_group) use the manager's
/// default config and are named `group-<n>` in creation order.
pub struct GroupManager<P> {
    defaults: Config,
    groups: Mutex<HashMap<String, Arc<Group<P>>>>,
    next_id: AtomicUsize,
}

impl<P: Send + 'static> Default for GroupManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Send + 'static> GroupManager<P> {
    pub fn new() -> Self {
        Self {
            defaults: Config::default(),
            groups: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Manager whose groups default to `config`. The config is validated
    /// here so that [`new_group`](Self::new_group) cannot fail.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            defaults: config,
            groups: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        })
    }

    pub fn new_group<F>(&self, handler: F) -> Arc<Group<P>>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        let name = loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let name = format!("group-{id}");
            if !groups.contains_key(&name) {
                break name;
            }
        };
        let config = self.defaults.clone().thread_name(name.clone());
        let group = Arc::new(Group {
            name: name.clone(),
            executor: Executor::start(config, Arc::new(handler), Arc::new(|_: HandlerFailure| {})),
        });

        debug!(group = %name, "group created");
        groups.insert(name, group.clone());
        group
    }

    /// Creates a group with its own config. Fails if the config is invalid
    /// or `name` is already taken.
    pub fn new_named_group<F>(
        &self,
        name: impl Into<String>,
        config: Config,
        handler: F,
    ) -> Result<Arc<Group<P>>, ConfigError>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
    {
        self.new_named_group_with_hook(name, config, handler, |_| {})
    }

    pub fn new_named_group_with_hook<F, H>(
        &self,
        name: impl Into<String>,
        config: Config,
        handler: F,
        on_failure: H,
    ) -> Result<Arc<Group<P>>, ConfigError>
    where
        F: Fn(&str, P) + Send + Sync + 'static,
        H: Fn(HandlerFailure) + Send + Sync + 'static,
    {
        let name = name.into();
        config.validate()?;

        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        if groups.contains_key(&name) {
            return Err(ConfigError::DuplicateGroup(name));
        }
        let group = Arc::new(Group {
            name: name.clone(),
            executor: Executor::with_failure_hook(config, handler, on_failure)?,
        });

        debug!(group = %name, "group created");
        groups.insert(name, group.clone());
        Ok(group)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Group<P>>> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn defaults(&self) -> &Config {
        &self.defaults
    }

    /// Stops every registered group.
    pub fn stop_all(&self) {
        for group in self.snapshot() {
            group.stop();
        }
    }

    /// Blocks until every registered group has no pending jobs.
    pub fn wait_all(&self) {
        for group in self.snapshot() {
            group.wait_all();
        }
    }

    pub async fn wait_all_async(&self) {
        let groups = self.snapshot();
        future::join_all(groups.iter().map(|g| g.wait_all_async())).await;
    }

    // Clones out of the lock so waiting never blocks group creation.
    fn snapshot(&self) -> Vec<Arc<Group<P>>> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
