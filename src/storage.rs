//! Durable key-value storage abstraction
//!
//! Every store in the engine persists through the `KeyValueStore` trait.
//! The shared storage space is partitioned by distinct keys per store; there
//! are no cross-store transactions. Two implementations are provided:
//! - `MemoryStore`: plain in-memory map, used in tests and as the degraded
//!   fallback when durable storage is unavailable
//! - `FileStore`: a single JSON file holding the whole key -> value map,
//!   written through on every mutation

use crate::error::StoreError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Generic get/set-by-key storage with string (JSON) values.
///
/// Durability is best effort: `put` may fail (quota, I/O) and callers are
/// expected to absorb the failure and keep serving from memory.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory key-value store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// File-backed key-value store.
///
/// The whole map is loaded once at open and rewritten on every mutation.
/// A corrupted file is treated the same as no data: the store starts empty
/// rather than failing to open.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open a file store at the given path, loading any existing map
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!(
                        "Corrupted storage file {}: {}; starting empty",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        self.flush()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.put("profile:v1", "{\"a\":1}").unwrap();

        assert_eq!(store.get("profile:v1").unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(store.get("missing").unwrap(), None);

        store.delete("profile:v1").unwrap();
        assert_eq!(store.get("profile:v1").unwrap(), None);
    }

    #[test]
    fn test_memory_store_keys() {
        let mut store = MemoryStore::new();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let mut store = FileStore::open(&path);
            store.put("events", "[]").unwrap();
            store.put("ab:hero", "{\"variant\":\"A\"}").unwrap();
        }

        let store = FileStore::open(&path);
        assert_eq!(store.get("events").unwrap().as_deref(), Some("[]"));
        assert_eq!(
            store.get("ab:hero").unwrap().as_deref(),
            Some("{\"variant\":\"A\"}")
        );
    }

    #[test]
    fn test_file_store_corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not valid json {{{").unwrap();

        let store = FileStore::open(&path);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nope.json"));
        assert!(store.keys().unwrap().is_empty());
    }
}
