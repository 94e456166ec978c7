pub mod file;
pub mod firebase;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

pub const DEFAULT_NAMESPACE: &str = "views";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store request failed: {key}: {source}")]
    Request {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("counter store returned status {status} for {key}")]
    Status { key: String, status: u16 },

    #[error("counter store value at {key} is not a non-negative integer: {value}")]
    InvalidValue { key: String, value: String },

    #[error("counter store file error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("counter store file is not valid JSON: {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("counter store node at {key} is not an object: {value}")]
    NotATree { key: String, value: String },

    #[error("invalid counter key '{key}'")]
    InvalidKey { key: String },

    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Remote associative store holding the view counters.
///
/// Keys are slash-separated paths such as `views/p1`. Nothing here is
/// transactional; a read followed by a write can interleave with other
/// writers.
#[async_trait]
pub trait CounterStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError>;

    /// All `(child, value)` pairs directly under `namespace`.
    async fn list(&self, namespace: &str) -> Result<BTreeMap<String, u64>, StoreError>;

    /// Server-side add. `Ok(None)` when the backend has no such primitive.
    async fn atomic_add(&self, _key: &str, _delta: u64) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    Firebase,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "file" | "json" => Some(Self::File),
            "firebase" | "rtdb" => Some(Self::Firebase),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Firebase => "firebase",
        }
    }
}

pub fn counter_key(namespace: &str, id: &str) -> String {
    format!("{}/{}", namespace.trim_matches('/'), id)
}

/// Rejects characters the realtime database refuses in path segments.
pub fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let bad = segment.is_empty()
        || segment
            .chars()
            .any(|c| matches!(c, '.' | '#' | '$' | '[' | ']' | '/') || c.is_control());
    if bad {
        return Err(StoreError::InvalidKey {
            key: segment.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn value_to_count(key: &str, value: &serde_json::Value) -> Result<u64, StoreError> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            // integral floats such as 3.0 come back from some writers
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                _ => Err(StoreError::InvalidValue {
                    key: key.to_string(),
                    value: n.to_string(),
                }),
            }
        }
        other => Err(StoreError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}
