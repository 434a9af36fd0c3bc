//! Web Storage tiers
//!
//! `localStorage` is the durable tier and `sessionStorage` the ephemeral
//! one. The handle is looked up on every call: `web_sys::Storage` is not
//! `Send`, and re-fetching it keeps [`BrowserStorage`] usable as a
//! [`StorageTier`].

use panaderia_core::{SessionStore, StorageError, StorageTier};
use std::fmt;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

/// One of the browser's Web Storage areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserStorage {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

impl fmt::Display for BrowserStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("localStorage"),
            Self::Session => f.write_str("sessionStorage"),
        }
    }
}

impl BrowserStorage {
    fn storage(self) -> Result<Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = match self {
            Self::Local => window.local_storage(),
            Self::Session => window.session_storage(),
        };
        storage
            .map_err(|e| StorageError::Unavailable(describe(&e)))?
            .ok_or_else(|| StorageError::Unavailable(format!("{self} is disabled")))
    }
}

fn describe(error: &JsValue) -> String {
    error
        .dyn_ref::<DomException>()
        .map(|e| format!("{}: {}", e.name(), e.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"))
}

fn write_error(error: &JsValue) -> StorageError {
    let quota = error
        .dyn_ref::<DomException>()
        .is_some_and(|e| e.name() == "QuotaExceededError");
    if quota {
        StorageError::QuotaExceeded(describe(error))
    } else {
        StorageError::Unavailable(describe(error))
    }
}

impl StorageTier for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(describe(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| write_error(&e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(describe(&e)))
    }
}

/// Session store over `localStorage` and `sessionStorage`
pub fn browser_session_store() -> SessionStore {
    SessionStore::new(BrowserStorage::Local, BrowserStorage::Session)
}
