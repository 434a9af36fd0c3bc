//! Panaderia core: session model, storage tiers and the session store

pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod store;
pub mod user;
pub mod validation;

#[cfg(all(feature = "tracing-init", not(target_arch = "wasm32")))]
pub mod telemetry;

#[cfg(any(test, feature = "tests"))]
pub mod tests;

pub use config::{ApiConfig, DEFAULT_API_BASE};
pub use error::{CoreError, CoreResult};
pub use session::{SESSION_KEYS, Session, SessionOptions, SessionPayload};
pub use storage::{MemoryStorage, NullStorage, StorageError, StorageTier};
pub use store::{SessionStore, Tier, TokenSource};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
