use super::KeyValueStorage;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// All keys in one JSON object on disk, rewritten in full on every change.
///
/// A missing file starts empty. So does a file that isn't a JSON object of
/// strings, after logging a warning; the next write replaces it.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    slots: BTreeMap<String, String>,
}

impl JsonFileStorage {
    pub fn open(path: &Path) -> Result<Self> {
        let slots = if path.exists() {
            let raw = fs::read(path).with_context(|| format!("read {}", path.display()))?;
            // any decode failure, invalid UTF-8 included, falls back to empty
            match serde_json::from_slice(&raw) {
                Ok(slots) => slots,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "ignoring unreadable storage file"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            slots,
        })
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.slots)?;
        // write-then-rename so a crash never leaves half a file behind
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.slots.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");

        let mut storage = JsonFileStorage::open(&path).unwrap();
        storage.set("expenses", "[]").unwrap();
        drop(storage);

        let reopened = JsonFileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("expenses").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");
        fs::write(&path, "not json at all").unwrap();

        let storage = JsonFileStorage::open(&path).unwrap();
        assert_eq!(storage.get("expenses").unwrap(), None);
    }

    #[test]
    fn test_non_utf8_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");
        fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

        let mut storage = JsonFileStorage::open(&path).unwrap();
        assert_eq!(storage.get("expenses").unwrap(), None);

        // next write replaces the junk
        storage.set("expenses", "[]").unwrap();
        let reopened = JsonFileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("expenses").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");

        let mut storage = JsonFileStorage::open(&path).unwrap();
        storage.set("a", "1").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
