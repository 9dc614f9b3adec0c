//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::authz::{PermissionCache, PermissionLookup, StaticCatalog};
use crate::config::Settings;
use crate::error::AppError;
use crate::session::{FileSessionStore, InMemorySessionStore, SessionContext, SessionStore};
use crate::users::UserStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Loaded configuration
    pub settings: Settings,

    /// Staff account directory backing the login flow
    pub users: UserStore,

    /// Authenticated-user lifecycle owner
    pub session: Arc<SessionContext>,

    /// Queryable permission snapshot for the signed-in session
    pub permissions: Arc<PermissionCache>,
}

impl AppState {
    /// Build the full state graph: session store (file-backed when
    /// configured, in-memory otherwise), session context hydrated once,
    /// permission cache subscribed to session changes, seeded accounts.
    pub async fn initialize(settings: Settings) -> Result<SharedState, AppError> {
        let store: Arc<dyn SessionStore> = match &settings.auth.session_file {
            Some(path) => Arc::new(FileSessionStore::new(path.clone())),
            None => Arc::new(InMemorySessionStore::new()),
        };

        let session = Arc::new(SessionContext::new(store.clone()));
        session.load();

        let lookup: Arc<dyn PermissionLookup> = Arc::new(StaticCatalog);
        let permissions = Arc::new(PermissionCache::new(store, lookup, session.subscribe()));

        let users = UserStore::new();
        users.seed_defaults().await?;

        Ok(Arc::new(Self {
            settings,
            users,
            session,
            permissions,
        }))
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
