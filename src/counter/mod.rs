use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{counter_key, CounterStore, StoreError, DEFAULT_NAMESPACE};

/// Outcome of a counter access as seen by a display fragment.
///
/// `Unavailable` is a store failure, never the same thing as `Count(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterReading {
    Count(u64),
    Unavailable,
}

impl CounterReading {
    pub fn count(self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(n),
            Self::Unavailable => None,
        }
    }

    pub fn or_zero(self) -> u64 {
        self.count().unwrap_or(0)
    }
}

impl fmt::Display for CounterReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Unavailable => write!(f, "\u{2014}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IncrementMode {
    /// Read the current value, write `current + 1`. Concurrent viewers can
    /// lose increments.
    #[default]
    ReadModifyWrite,
    /// Use the store's server-side add when it has one, otherwise fall back
    /// to read-modify-write.
    Atomic,
}

impl IncrementMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadModifyWrite => "read-modify-write",
            Self::Atomic => "atomic",
        }
    }
}

/// Per-project view counters under one namespace of a [`CounterStore`].
#[derive(Clone)]
pub struct ViewCounter {
    store: Arc<dyn CounterStore>,
    namespace: String,
    mode: IncrementMode,
}

impl fmt::Debug for ViewCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCounter")
            .field("backend", &self.store.backend_tag())
            .field("namespace", &self.namespace)
            .field("mode", &self.mode)
            .finish()
    }
}

impl ViewCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            mode: IncrementMode::default(),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        let trimmed = namespace.trim().trim_matches('/');
        if !trimmed.is_empty() {
            self.namespace = trimmed.to_string();
        }
        self
    }

    pub fn with_mode(mut self, mode: IncrementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn key(&self, id: &str) -> String {
        counter_key(&self.namespace, id)
    }

    pub async fn try_read(&self, id: &str) -> Result<u64, StoreError> {
        let key = self.key(id);
        if !self.store.exists(&key).await? {
            return Ok(0);
        }
        Ok(self.store.get(&key).await?.unwrap_or(0))
    }

    /// The read always happens before its write; nothing guards the gap.
    pub async fn try_increment(&self, id: &str) -> Result<u64, StoreError> {
        let key = self.key(id);
        if self.mode == IncrementMode::Atomic {
            if let Some(next) = self.store.atomic_add(&key, 1).await? {
                debug!(%key, views = next, "counter incremented atomically");
                return Ok(next);
            }
            debug!(backend = self.store.backend_tag(), "no atomic add, falling back");
        }
        let current = self.store.get(&key).await?.unwrap_or(0);
        let next = current.saturating_add(1);
        self.store.set(&key, next).await?;
        debug!(%key, views = next, "counter incremented");
        Ok(next)
    }

    pub async fn try_total(&self) -> Result<u64, StoreError> {
        let all = self.store.list(&self.namespace).await?;
        Ok(all.values().fold(0u64, |acc, v| acc.saturating_add(*v)))
    }

    pub async fn read_counter(&self, id: &str) -> CounterReading {
        match self.try_read(id).await {
            Ok(n) => CounterReading::Count(n),
            Err(e) => {
                warn!(project = id, error = %e, "error loading view count");
                CounterReading::Unavailable
            }
        }
    }

    pub async fn increment_counter(&self, id: &str) -> CounterReading {
        match self.try_increment(id).await {
            Ok(n) => CounterReading::Count(n),
            Err(e) => {
                warn!(project = id, error = %e, "error updating view count");
                CounterReading::Unavailable
            }
        }
    }

    pub async fn aggregate_all_counters(&self) -> CounterReading {
        match self.try_total().await {
            Ok(n) => CounterReading::Count(n),
            Err(e) => {
                warn!(error = %e, "error loading total views");
                CounterReading::Unavailable
            }
        }
    }
}
