//! Local session store implementations.
//!
//! - [`FileSessionStore`] keeps every key in one JSON object at
//!   `{data_dir}/session.json`. Writes go to a temp file in the same
//!   directory and are renamed over the original.
//! - [`MemorySessionStore`] is a `DashMap`-backed store for tests and
//!   throwaway runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use dowurk_core::store::SessionStore;
use dowurk_types::error::StoreError;

/// File name of the session store inside the data directory.
pub const SESSION_FILE: &str = "session.json";

/// JSON-file-backed session store.
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Store rooted at `{data_dir}/session.json`. The file is created on the
    /// first write.
    pub fn new(data_dir: &Path) -> Self {
        Self::at_path(data_dir.join(SESSION_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Serialization(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(StoreError::Serialization(format!(
                "failed to parse {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(map)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("failed to create {}: {e}", parent.display())))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &content)
            .await
            .map_err(|e| StoreError::Io(format!("failed to write {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("failed to replace {}: {e}", self.path.display())))
    }
}

impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut map = self.read_map().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.clone());
        self.write_map(&map).await?;
        tracing::debug!(key, path = %self.path.display(), "session value stored");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// In-memory session store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
