//! JSON-file key-value store
//!
//! The whole store lives in one JSON object. Every mutation writes the new
//! object to a temporary file in the same directory and renames it over the
//! original, so a crash leaves either the old or the new contents on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// File-backed store with atomic replace-on-write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    ///
    /// # Errors
    /// Returns `StorageError::Io` when the file exists but cannot be read and
    /// `StorageError::Corrupt` when it is not a JSON object of strings.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|source| StorageError::Corrupt { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file store");

        Ok(Self { path, entries: Mutex::new(entries) })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the entries, persist it, then commit it to
    /// the in-memory view. Nothing changes if persisting fails.
    fn mutate<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        change(&mut next);

        if next == *entries {
            return Ok(());
        }

        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let json = serde_json::to_vec_pretty(entries)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tmp.write_all(&json).map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| StorageError::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), keys = entries.len(), "Persisted file store");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.mutate(|map| {
            map.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        self.mutate(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        self.mutate(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).unwrap();

        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set_many(&[("a", "1"), ("b", "2")]).unwrap();
        store.delete("a").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).unwrap();
        store.set("k", "v").unwrap();
        store.delete_many(&["k", "missing"]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }
}
