//! Key-value persistence for client-side state
//!
//! The blog keeps every piece of state (OAuth artifacts, playlist) as string
//! values under flat keys, the way a browser's local storage does. This
//! module provides that interface as an injectable trait so callers never
//! reach for a global store.
//!
//! - **[`KeyValueStore`]**: get/set/delete by key, plus multi-key writes
//! - **[`MemoryStore`]**: process-local map (tests, ephemeral sessions)
//! - **[`FileStore`]**: JSON file replaced atomically on every write

pub mod error;
pub mod file;
pub mod memory;

use std::sync::Arc;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// String key-value store.
///
/// Single-key operations are atomic. `set_many` and `delete_many` default to
/// a sequence of single-key calls; implementations that can apply a batch in
/// one step should override them.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Write several entries together.
    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys.
    ///
    /// Every key is attempted even if an earlier one fails; the first
    /// failure is returned.
    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(err) = self.delete(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Check whether a key holds a value.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        (**self).set_many(entries)
    }

    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        (**self).delete_many(keys)
    }

    fn contains(&self, key: &str) -> StorageResult<bool> {
        (**self).contains(key)
    }
}
