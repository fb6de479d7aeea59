//! Small string key-value persistence for calculator state, plus a typed
//! wrapper that stores values as JSON.

use crate::error::StoreError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
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

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys live in one JSON object on disk. A missing file reads as empty;
/// every `set` rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!("Stored '{}' in {}", key, self.path.display());
        Ok(())
    }
}

/// A value of type `T` kept under one key.
///
/// Loading never fails: a missing key, unreadable store or undecodable data
/// all yield a fresh default. Saving logs failures and carries on.
pub struct Persisted<T> {
    key: String,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> Persisted<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load_or(&self, store: &dyn KeyValueStore, initial: T) -> T {
        let raw = match store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return initial,
            Err(err) => {
                warn!("Failed to read '{}': {}", self.key, err);
                return initial;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("Discarding stored '{}': {}", self.key, err);
                initial
            }
        }
    }

    pub fn load_or_default(&self, store: &dyn KeyValueStore) -> T
    where
        T: Default,
    {
        self.load_or(store, T::default())
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| store.set(&self.key, &raw));
        if let Err(err) = result {
            warn!("Failed to save '{}': {}", self.key, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scientific::History;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("mode").unwrap(), None);
        store.set("mode", "\"RAD\"").unwrap();
        assert_eq!(store.get("mode").unwrap().as_deref(), Some("\"RAD\""));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = FileStore::new(&path);
        assert_eq!(store.get("history").unwrap(), None);
        store.set("history", "[]").unwrap();
        store.set("mode", "\"DEG\"").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("history").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("mode").unwrap().as_deref(), Some("\"DEG\""));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("history"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_persisted_fallback() {
        let mut store = MemoryStore::new();
        let counter: Persisted<Vec<u32>> = Persisted::new("counter");
        assert_eq!(counter.load_or(&store, vec![7]), vec![7]);

        store.set("counter", "{broken").unwrap();
        assert_eq!(counter.load_or_default(&store), Vec::<u32>::new());

        counter.save(&mut store, &vec![1, 2, 3]);
        assert_eq!(counter.load_or_default(&store), vec![1, 2, 3]);
    }

    #[test]
    fn test_persisted_history() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("unicalc.json"));
        let persisted: Persisted<History> = Persisted::new("history");

        let mut history = History::default();
        history.push("2+2", "4");
        persisted.save(&mut store, &history);

        let loaded = persisted.load_or_default(&store);
        assert_eq!(loaded, history);
        assert_eq!(loaded.latest().map(|e| e.result.as_str()), Some("4"));
    }

    #[test]
    fn test_persisted_unreadable_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2]").unwrap();

        let store = FileStore::new(&path);
        let persisted: Persisted<Vec<u32>> = Persisted::new("values");
        assert_eq!(persisted.load_or(&store, vec![9]), vec![9]);
    }
}
