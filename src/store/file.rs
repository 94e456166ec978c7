use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::{value_to_count, CounterStore, StoreError};

/// Counters kept in a local JSON document shaped like the realtime database
/// tree, e.g. `{ "views": { "p1": 3 } }`.
///
/// Writes within one process are serialized; separate processes sharing the
/// file get last-write-wins, the same as the remote store.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_tree(&self) -> Result<Value, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Value::Object(Map::new())),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: self.path.display().to_string(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::Object(Map::new())),
            Err(e) => Err(StoreError::Io {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    async fn write_tree(&self, tree: &Value) -> Result<(), StoreError> {
        let io_err = |e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(tree).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split('/').filter(|s| !s.is_empty())
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let mut node = tree;
    for seg in segments(key) {
        node = node.as_object()?.get(seg)?;
    }
    Some(node)
}

/// Writes `value` at `key`, creating missing parents. A null node counts as
/// missing; any other non-object node on the path is left untouched.
fn insert(tree: &mut Value, key: &str, value: u64) -> Result<(), StoreError> {
    let parts: Vec<&str> = segments(key).collect();
    if parts.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
        });
    }
    let mut node = tree;
    for (depth, seg) in parts.iter().enumerate() {
        if node.is_null() {
            *node = Value::Object(Map::new());
        }
        let map = match node {
            Value::Object(map) => map,
            other => {
                let at = parts[..depth].join("/");
                return Err(StoreError::NotATree {
                    key: if at.is_empty() { "/".to_string() } else { at },
                    value: other.to_string(),
                });
            }
        };
        if depth + 1 == parts.len() {
            map.insert(seg.to_string(), Value::from(value));
            break;
        }
        node = map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Ok(())
}

#[async_trait]
impl CounterStore for FileStore {
    fn backend_tag(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let tree = self.read_tree().await?;
        match lookup(&tree, key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => value_to_count(key, v).map(Some),
        }
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut tree = self.read_tree().await?;
        insert(&mut tree, key, value)?;
        self.write_tree(&tree).await?;
        debug!(key, value, path = %self.path.display(), "counter written");
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<BTreeMap<String, u64>, StoreError> {
        let tree = self.read_tree().await?;
        let mut out = BTreeMap::new();
        let Some(Value::Object(children)) = lookup(&tree, namespace) else {
            return Ok(out);
        };
        for (child, value) in children {
            match value_to_count(child, value) {
                Ok(n) => {
                    out.insert(child.clone(), n);
                }
                Err(e) => tracing::warn!(error = %e, "skipping counter"),
            }
        }
        Ok(out)
    }

    async fn atomic_add(&self, key: &str, delta: u64) -> Result<Option<u64>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut tree = self.read_tree().await?;
        let current = match lookup(&tree, key) {
            None | Some(Value::Null) => 0,
            Some(v) => value_to_count(key, v)?,
        };
        let next = current.saturating_add(delta);
        insert(&mut tree, key, next)?;
        self.write_tree(&tree).await?;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("showcase-filestore-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let store = FileStore::new(temp_path("missing"));
        assert_eq!(store.get("views/p1").await.unwrap(), None);
        assert!(store.list("views").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_then_get_and_list() {
        let path = temp_path("roundtrip");
        let store = FileStore::new(path.clone());
        store.set("views/p1", 3).await.unwrap();
        store.set("views/p2", 4).await.unwrap();
        assert_eq!(store.get("views/p1").await.unwrap(), Some(3));
        let listed = store.list("views").await.unwrap();
        assert_eq!(listed.values().sum::<u64>(), 7);

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let tree: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(tree["views"]["p2"], 4);
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let store = FileStore::new(path.clone());
        assert!(matches!(
            store.get("views/p1").await,
            Err(StoreError::Corrupt { .. })
        ));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn non_object_tree_is_not_overwritten() {
        let path = temp_path("array-root");
        tokio::fs::write(&path, "[1, 2]").await.unwrap();
        let store = FileStore::new(path.clone());
        assert!(matches!(
            store.set("views/p1", 1).await,
            Err(StoreError::NotATree { .. })
        ));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "[1, 2]");

        tokio::fs::write(&path, r#"{"views": 7}"#).await.unwrap();
        assert!(store.atomic_add("views/p1", 1).await.is_err());
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn null_parent_is_replaced() {
        let path = temp_path("null-parent");
        tokio::fs::write(&path, r#"{"views": null}"#).await.unwrap();
        let store = FileStore::new(path.clone());
        store.set("views/p1", 2).await.unwrap();
        assert_eq!(store.get("views/p1").await.unwrap(), Some(2));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
