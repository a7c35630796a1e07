//! Key-value storage tiers backing the session.
//!
//! A session uses two tiers: a persistent one that survives restarts and an
//! ephemeral one that lives as long as the process. Both sit behind
//! `KeyValueStore` so tests can swap in `MemoryStore` for either.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{ApiError, ApiResult};

/// A string-to-string store shared across the process.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ApiResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ApiResult<()>;
    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> ApiResult<()>;
}

/// In-memory tier. Used as the ephemeral tier and as a test fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Persistent tier stored as a single JSON object file.
///
/// The file is read on every access so several `FileStore` values pointing at
/// the same path observe each other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/session.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ApiResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ApiError::Storage(format!("read {}: {e}", self.path.display())))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| ApiError::Storage(format!("parse {}: {e}", self.path.display())))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ApiError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("clinic-core-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("token").unwrap(), None);
        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("nothing").is_ok());
    }

    #[test]
    fn file_store_survives_new_instance() {
        let dir = scratch_dir();
        FileStore::in_dir(&dir).set("token", "persisted").unwrap();

        let reopened = FileStore::in_dir(&dir);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("persisted"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let store = FileStore::in_dir(scratch_dir());
        assert_eq!(store.get("token").unwrap(), None);
        assert!(store.remove("token").is_ok());
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_remove_keeps_other_keys() {
        let dir = scratch_dir();
        let store = FileStore::in_dir(&dir);
        store.set("token", "t").unwrap();
        store.set("user", "{}").unwrap();
        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(store.get("user").unwrap().as_deref(), Some("{}"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_corrupt_file_is_storage_error() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::in_dir(&dir);
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.get("token"), Err(ApiError::Storage(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
