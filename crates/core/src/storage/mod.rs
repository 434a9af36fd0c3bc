//! Key-value persistence tiers
//!
//! A tier is anything that can `get`/`set`/`remove` string values. The
//! session store holds two of them (durable and ephemeral) and never lets a
//! tier failure escape to its callers.

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Errors reported by a storage tier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store cannot be reached (privacy mode, missing window)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backing store refused the write
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Reading or writing the backing file failed
    #[error("Storage IO failed: {0}")]
    Io(String),

    /// Stored data could not be decoded
    #[error("Storage data corrupted: {0}")]
    Corrupted(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Capability interface over a string key-value store
#[cfg_attr(test, mockall::automock)]
pub trait StorageTier: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: StorageTier + ?Sized> StorageTier for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-process tier, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageTier for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Null object for environments without any persistent storage
///
/// Reads always miss and writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

impl StorageTier for NullStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::StorageTierTestSuite;

    #[test]
    fn test_memory_storage_contract() {
        StorageTierTestSuite::new(MemoryStorage::new()).run_all_tests();
    }

    #[test]
    fn test_null_storage_never_holds_values() {
        let storage = NullStorage;
        storage.set("auth.access", "tok").unwrap();
        assert_eq!(storage.get("auth.access").unwrap(), None);
        storage.remove("auth.access").unwrap();
    }

    #[test]
    fn test_shared_tier_through_arc() {
        let shared = Arc::new(MemoryStorage::new());
        let other = Arc::clone(&shared);
        shared.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(shared.len(), 1);
    }
}
