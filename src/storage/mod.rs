//! Durable key-value slots.
//!
//! The expense store only ever touches one key, but the backends are plain
//! string-to-string maps so they stay independent of the record format.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// File name of the SQLite backend inside the data directory
pub const SQLITE_FILE: &str = "expenses.db";

/// File name of the JSON backend inside the data directory
pub const JSON_FILE: &str = "storage.json";

/// A synchronous, local key-value store.
pub trait KeyValueStorage {
    /// Read a value; `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Json => "json",
            StorageBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "unknown storage backend '{other}' (expected sqlite, json or memory)"
            )),
        }
    }
}

/// Open the selected backend rooted at `data_dir`, creating the directory if needed.
pub fn open_storage(backend: StorageBackend, data_dir: &Path) -> Result<Box<dyn KeyValueStorage>> {
    let storage: Box<dyn KeyValueStorage> = match backend {
        StorageBackend::Memory => Box::new(MemoryStorage::new()),
        StorageBackend::Sqlite => {
            ensure_dir(data_dir)?;
            Box::new(SqliteStorage::open(&data_dir.join(SQLITE_FILE))?)
        }
        StorageBackend::Json => {
            ensure_dir(data_dir)?;
            Box::new(JsonFileStorage::open(&data_dir.join(JSON_FILE))?)
        }
    };

    tracing::debug!(backend = %backend, dir = %data_dir.display(), "storage opened");
    Ok(storage)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create data dir {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<StorageBackend>(), Ok(StorageBackend::Sqlite));
        assert_eq!("json".parse::<StorageBackend>(), Ok(StorageBackend::Json));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_open_storage_creates_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");

        let mut storage = open_storage(StorageBackend::Json, &dir).unwrap();
        storage.set("k", "v").unwrap();

        assert!(dir.join(JSON_FILE).exists());
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_boxed_storage_delegates() {
        let mut storage: Box<dyn KeyValueStorage> = Box::new(MemoryStorage::new());
        storage.set("a", "1").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
    }
}
