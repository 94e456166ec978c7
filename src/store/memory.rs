use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CounterStore, StoreError};

/// In-process store. Reads and writes can be made to fail on demand.
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, u64>>,
    supports_atomic: bool,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub get_calls: AtomicU64,
    pub set_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            supports_atomic: false,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            get_calls: AtomicU64::new(0),
            set_calls: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that also offers `atomic_add`.
    pub fn with_atomic_add() -> Self {
        Self {
            supports_atomic: true,
            ..Self::default()
        }
    }

    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        let store = Self::default();
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            entries: Mutex::new(map),
            ..store
        }
    }

    pub async fn snapshot(&self) -> BTreeMap<String, u64> {
        self.entries.lock().await.clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.check_reads()?;
        Ok(self.entries.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.set_calls.fetch_add(1, Ordering::Relaxed);
        self.check_writes()?;
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<BTreeMap<String, u64>, StoreError> {
        self.check_reads()?;
        let prefix = format!("{}/", namespace.trim_matches('/'));
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter_map(|(k, v)| {
                let child = k.strip_prefix(&prefix)?;
                if child.contains('/') {
                    return None;
                }
                Some((child.to_string(), *v))
            })
            .collect())
    }

    async fn atomic_add(&self, key: &str, delta: u64) -> Result<Option<u64>, StoreError> {
        if !self.supports_atomic {
            return Ok(None);
        }
        self.check_writes()?;
        let mut entries = self.entries.lock().await;
        let slot = entries.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(delta);
        Ok(Some(*slot))
    }
}
