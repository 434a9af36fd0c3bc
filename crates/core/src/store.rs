//! Session store
//!
//! Owns the in-memory [`Session`] and keeps it in step with two persistence
//! tiers. Exactly one tier holds the session at a time, chosen by the
//! remember-me flag at login; writing to one tier purges the other first.
//!
//! Several stores (browser tabs, CLI processes) may share the same tiers.
//! There is no locking between them: the last writer wins and the others
//! reconcile through [`SessionStore::handle_storage_event`].

use crate::session::{
    ACCESS_KEY, REFRESH_KEY, REMEMBER_KEY, SESSION_KEYS, Session, SessionOptions, SessionPayload,
    USER_KEY, is_session_key, parse_user,
};
use crate::storage::{MemoryStorage, NullStorage, StorageTier};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Supplies the bearer token for authenticated requests
pub trait TokenSource: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> Option<String>;
}

/// Which persistence tier a session lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Survives restarts; used when "remember me" is set
    Durable,
    /// Scoped to the tab or login session
    Ephemeral,
}

impl Tier {
    /// Tier selected by the remember-me flag
    pub fn for_remember(remember: bool) -> Self {
        if remember { Self::Durable } else { Self::Ephemeral }
    }

    /// The other tier
    pub fn opposite(self) -> Self {
        match self {
            Self::Durable => Self::Ephemeral,
            Self::Ephemeral => Self::Durable,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => f.write_str("durable"),
            Self::Ephemeral => f.write_str("ephemeral"),
        }
    }
}

/// Single source of truth for the authenticated session
pub struct SessionStore {
    durable: Box<dyn StorageTier>,
    ephemeral: Box<dyn StorageTier>,
    state: watch::Sender<Session>,
    persistent: AtomicBool,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.is_persistent())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store over the given tiers and load whatever they hold
    pub fn new(
        durable: impl StorageTier + 'static,
        ephemeral: impl StorageTier + 'static,
    ) -> Self {
        let store = Self {
            durable: Box::new(durable),
            ephemeral: Box::new(ephemeral),
            state: watch::Sender::new(Session::default()),
            persistent: AtomicBool::new(true),
        };
        let loaded = store.load_persisted_session();
        store.state.send_replace(loaded);
        store
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new(), MemoryStorage::new())
    }

    /// Store for environments without storage: nothing is ever persisted
    pub fn unpersisted() -> Self {
        Self::new(NullStorage, NullStorage)
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Whether a user is logged in
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// False once a tier write failed, until a reload finds a persisted
    /// session. While false, requests fall back to the in-memory token.
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    /// Read the session from storage: durable tier first, then ephemeral
    ///
    /// The first tier holding a non-empty access token wins. Never fails;
    /// unreadable tiers and unparsable user blobs read as absent.
    pub fn load_persisted_session(&self) -> Session {
        self.read_tier(Tier::Durable)
            .or_else(|| self.read_tier(Tier::Ephemeral))
            .unwrap_or_default()
    }

    /// Replace the session after a successful login and persist it
    ///
    /// `remember` comes from `options`, else from the payload, else the
    /// previous value. The session is written to the tier that flag selects
    /// after the opposite tier is purged.
    pub fn set_session(&self, payload: SessionPayload, options: SessionOptions) -> Session {
        let previous_remember = self.state.borrow().remember;
        let remember = options
            .remember
            .or(payload.remember)
            .unwrap_or(previous_remember);

        let next = Session::from_parts(
            payload.access_token,
            payload.refresh_token,
            payload.user,
            remember,
        );

        let persisted = self.persist(&next);
        self.persistent.store(persisted, Ordering::Release);
        info!(
            authenticated = next.is_authenticated,
            tier = %Tier::for_remember(remember),
            persisted,
            "Session updated"
        );

        self.state.send_replace(next.clone());
        next
    }

    /// Clear both tiers and reset to the empty session. Idempotent.
    pub fn logout(&self) {
        let mut cleared = true;
        for tier in [Tier::Durable, Tier::Ephemeral] {
            for key in SESSION_KEYS {
                cleared &= self.remove_key(tier, key);
            }
        }
        self.persistent.store(cleared, Ordering::Release);
        info!("Session cleared");

        self.state.send_if_modified(|current| {
            if *current == Session::default() {
                false
            } else {
                *current = Session::default();
                true
            }
        });
    }

    /// Re-read storage and replace the in-memory session
    ///
    /// Storage always wins, even on a degraded store, so a logout in another
    /// tab reaches this one. Finding a persisted session clears the degraded
    /// flag.
    pub fn refresh_auth_state(&self) -> Session {
        let loaded = self.load_persisted_session();
        if loaded.is_authenticated && !self.persistent.swap(true, Ordering::AcqRel) {
            debug!("Persisted session found, leaving memory-only mode");
        }
        self.state.send_if_modified(|current| {
            if *current == loaded {
                false
            } else {
                debug!(
                    authenticated = loaded.is_authenticated,
                    "Session changed in storage"
                );
                *current = loaded.clone();
                true
            }
        });
        loaded
    }

    /// React to a storage-change notification from another tab or process
    ///
    /// `None` means the whole storage area changed. Returns whether the
    /// session was re-read.
    pub fn handle_storage_event(&self, key: Option<&str>) -> bool {
        match key {
            Some(key) if !is_session_key(key) => false,
            _ => {
                self.refresh_auth_state();
                true
            }
        }
    }

    /// Access token from storage: ephemeral tier first, then durable
    pub fn persisted_access_token(&self) -> Option<String> {
        [Tier::Ephemeral, Tier::Durable]
            .into_iter()
            .find_map(|tier| self.read_key(tier, ACCESS_KEY).filter(|t| !t.is_empty()))
    }

    fn storage(&self, tier: Tier) -> &dyn StorageTier {
        match tier {
            Tier::Durable => self.durable.as_ref(),
            Tier::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    fn read_tier(&self, tier: Tier) -> Option<Session> {
        let access = self.read_key(tier, ACCESS_KEY).filter(|t| !t.is_empty())?;
        Some(Session::from_parts(
            Some(access),
            self.read_key(tier, REFRESH_KEY),
            parse_user(self.read_key(tier, USER_KEY)),
            self.read_key(tier, REMEMBER_KEY).as_deref() == Some("true"),
        ))
    }

    fn read_key(&self, tier: Tier, key: &str) -> Option<String> {
        match self.storage(tier).get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(%tier, key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    fn write_key(&self, tier: Tier, key: &str, value: Option<&str>) -> bool {
        let storage = self.storage(tier);
        let result = match value {
            Some(value) => storage.set(key, value),
            None => storage.remove(key),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(%tier, key, error = %e, "Failed to write session key");
                false
            }
        }
    }

    fn remove_key(&self, tier: Tier, key: &str) -> bool {
        self.write_key(tier, key, None)
    }

    fn persist(&self, session: &Session) -> bool {
        let active = Tier::for_remember(session.remember);
        let mut ok = true;

        for key in SESSION_KEYS {
            ok &= self.remove_key(active.opposite(), key);
        }

        let user = session
            .user
            .as_ref()
            .and_then(|user| serde_json::to_string(user).ok());

        if !self.write_key(active, ACCESS_KEY, session.access_token.as_deref()) {
            // No token, no session: leave nothing half-written behind
            for key in SESSION_KEYS {
                self.remove_key(active, key);
            }
            return false;
        }
        ok &= self.write_key(active, REFRESH_KEY, session.refresh_token.as_deref());
        ok &= self.write_key(active, USER_KEY, user.as_deref());
        ok &= self.write_key(
            active,
            REMEMBER_KEY,
            Some(if session.remember { "true" } else { "false" }),
        );
        ok
    }
}

impl TokenSource for SessionStore {
    fn access_token(&self) -> Option<String> {
        self.persisted_access_token().or_else(|| {
            if self.is_persistent() {
                None
            } else {
                self.state.borrow().access_token.clone()
            }
        })
    }
}

impl<T: TokenSource + ?Sized> TokenSource for std::sync::Arc<T> {
    fn access_token(&self) -> Option<String> {
        (**self).access_token()
    }
}
