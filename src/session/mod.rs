//! Auth session context
//!
//! Owns the authenticated-user record's lifecycle: hydrated once from the
//! persisted session store at startup, replaced at login, cleared at
//! logout. The record is trusted as-is from local storage; it is not
//! re-validated against anything on read. Expiry is enforced by the edge
//! gate rejecting a stale or absent cookie on the next navigation, not by
//! a timer here.
//!
//! Login and logout bump a version counter that the permission cache
//! subscribes to, so permission snapshots follow session changes
//! immediately instead of waiting out a polling interval.

use crate::auth::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

/// The signed-in user record persisted between page loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: uuid::Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

/// Session storage failure
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted session store boundary.
///
/// Reads are synchronous and local; there is no network round-trip in a
/// session load. Writing happens at login, clearing at logout.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthenticatedUser>, SessionError>;
    fn save(&self, user: &AuthenticatedUser) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// In-memory session store, the default when no session file is
/// configured. Also what the tests run against.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slot: Mutex<Option<AuthenticatedUser>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<AuthenticatedUser>, SessionError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, user: &AuthenticatedUser) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON-file-backed session store.
///
/// A missing file is an anonymous session. A corrupt file is treated the
/// same, with a warning, rather than failing the whole bootstrap.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AuthenticatedUser>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "session file is corrupt, treating as anonymous");
                Ok(None)
            }
        }
    }

    fn save(&self, user: &AuthenticatedUser) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(user)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Before the persisted store has been read
    Loading,
    Authenticated(AuthenticatedUser),
    Anonymous,
}

/// Owner of the authenticated-user lifecycle.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    version: watch::Sender<u64>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            store,
            state: RwLock::new(SessionState::Loading),
            version,
        }
    }

    /// One-time hydration from the persisted store. Transitions
    /// `Loading` to `Authenticated` or `Anonymous`; a store failure is an
    /// anonymous session, not a startup error.
    pub fn load(&self) {
        let next = match self.store.load() {
            Ok(Some(user)) => SessionState::Authenticated(user),
            Ok(None) => SessionState::Anonymous,
            Err(err) => {
                warn!(%err, "failed to read persisted session, treating as anonymous");
                SessionState::Anonymous
            }
        };
        *self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Current lifecycle state snapshot.
    pub fn current(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to session-change notifications. The receiver observes a
    /// version bump on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Persist a fresh login and notify subscribers.
    pub fn login(&self, user: AuthenticatedUser) -> Result<(), SessionError> {
        self.store.save(&user)?;
        *self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = SessionState::Authenticated(user);
        self.bump();
        Ok(())
    }

    /// Clear the persisted record and notify subscribers. Navigation back
    /// to the login page is the HTTP layer's concern.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = SessionState::Anonymous;
        self.bump();
        Ok(())
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_user() -> AuthenticatedUser {
        AuthenticatedUser {
            id: uuid::Uuid::new_v4(),
            username: "mai.pham".to_string(),
            name: "Mai Pham".to_string(),
            role: Role::RegionalManager,
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn context_transitions_through_lifecycle() {
        let ctx = SessionContext::new(Arc::new(InMemorySessionStore::new()));
        assert_eq!(ctx.current(), SessionState::Loading);

        ctx.load();
        assert_eq!(ctx.current(), SessionState::Anonymous);

        let user = sample_user();
        ctx.login(user.clone()).unwrap();
        assert_eq!(ctx.current(), SessionState::Authenticated(user));

        ctx.logout().unwrap();
        assert_eq!(ctx.current(), SessionState::Anonymous);
    }

    #[test]
    fn login_and_logout_notify_subscribers() {
        let ctx = SessionContext::new(Arc::new(InMemorySessionStore::new()));
        let mut rx = ctx.subscribe();
        assert!(!rx.has_changed().unwrap());

        ctx.login(sample_user()).unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        ctx.logout().unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        let user = sample_user();
        store.save(&user).unwrap();
        assert_eq!(store.load().unwrap(), Some(user));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing an already-clear store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_session_file_reads_as_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::new(path);
        assert_eq!(store.load().unwrap(), None);
    }
}
