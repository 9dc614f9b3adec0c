//! Permission cache
//!
//! A queryable snapshot of the signed-in session's role and permissions.
//! Sidebar assembly and per-screen guards call the synchronous `has_*`
//! queries on every render; the snapshot behind them is refreshed
//!
//! - lazily, on the first query after construction,
//! - immediately, when the session context signals a login or logout,
//! - on a fixed cadence by an optional background task, as a safety net
//!   for session mutations that bypass the context (e.g. another process
//!   rewriting the session file).
//!
//! The snapshot is always replaced whole, never mutated in place, so a
//! reader can never observe a half-updated permission set. Between
//! refreshes the cache serves the same answers; staleness is bounded by
//! the polling interval.

use crate::auth::Role;
use crate::authz::PermissionLookup;
use crate::session::SessionStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    role: Option<Role>,
    permissions: HashSet<String>,
}

/// Process-wide permission snapshot over the persisted session record.
pub struct PermissionCache {
    store: Arc<dyn SessionStore>,
    lookup: Arc<dyn PermissionLookup>,
    snapshot: RwLock<Option<Snapshot>>,
    session_events: Mutex<watch::Receiver<u64>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl PermissionCache {
    pub fn new(
        store: Arc<dyn SessionStore>,
        lookup: Arc<dyn PermissionLookup>,
        session_events: watch::Receiver<u64>,
    ) -> Self {
        Self {
            store,
            lookup,
            snapshot: RwLock::new(None),
            session_events: Mutex::new(session_events),
            refresh_task: Mutex::new(None),
        }
    }

    /// Start the periodic safety-net refresh. The task holds only a weak
    /// reference, so dropping the cache stops it rather than leaking a
    /// timer for the process lifetime.
    pub fn start_refresh(self: &Arc<Self>, interval: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so startup
            // isn't counted as a refresh.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else { break };
                cache.refresh();
            }
        });
        *self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Rebuild the snapshot from the persisted session record.
    pub fn refresh(&self) {
        let user = match self.store.load() {
            Ok(user) => user,
            Err(err) => {
                warn!(%err, "session store read failed, clearing permission snapshot");
                None
            }
        };
        let snapshot = match user {
            Some(user) => Snapshot {
                role: Some(user.role),
                permissions: self.lookup.permissions_for(user.role),
            },
            None => Snapshot::default(),
        };
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Whether the current session holds a permission.
    pub fn has_permission(&self, name: &str) -> bool {
        self.ensure_fresh();
        self.read(|snap| snap.permissions.contains(name))
    }

    /// Whether the current session holds any of the given permissions.
    pub fn has_any_permission(&self, names: &[&str]) -> bool {
        self.ensure_fresh();
        self.read(|snap| names.iter().any(|n| snap.permissions.contains(*n)))
    }

    /// Whether the current session holds all of the given permissions.
    pub fn has_all_permissions(&self, names: &[&str]) -> bool {
        self.ensure_fresh();
        self.read(|snap| names.iter().all(|n| snap.permissions.contains(*n)))
    }

    /// Snapshot of the current permission set.
    pub fn permissions(&self) -> HashSet<String> {
        self.ensure_fresh();
        self.read(|snap| snap.permissions.clone())
    }

    /// Role of the current session, if any.
    pub fn role(&self) -> Option<Role> {
        self.ensure_fresh();
        self.read(|snap| snap.role)
    }

    /// Whether the current session holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Refresh if the session changed since the last query, or if no
    /// snapshot has been taken yet.
    fn ensure_fresh(&self) {
        let session_changed = {
            let mut rx = self
                .session_events
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if rx.has_changed().unwrap_or(false) {
                rx.borrow_and_update();
                true
            } else {
                false
            }
        };
        let unprimed = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none();
        if session_changed || unprimed {
            self.refresh();
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let guard = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(snap) => f(snap),
            // ensure_fresh primed the snapshot before every read path.
            None => f(&Snapshot::default()),
        }
    }
}

impl Drop for PermissionCache {
    fn drop(&mut self) {
        if let Some(handle) = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{permissions, StaticCatalog};
    use crate::session::{AuthenticatedUser, InMemorySessionStore, SessionContext};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: uuid::Uuid::new_v4(),
            username: "thu.le".to_string(),
            name: "Thu Le".to_string(),
            role,
            issued_at: Utc::now(),
        }
    }

    fn setup() -> (
        Arc<InMemorySessionStore>,
        Arc<SessionContext>,
        Arc<PermissionCache>,
    ) {
        let store = Arc::new(InMemorySessionStore::new());
        let ctx = Arc::new(SessionContext::new(store.clone()));
        let cache = Arc::new(PermissionCache::new(
            store.clone(),
            Arc::new(StaticCatalog),
            ctx.subscribe(),
        ));
        (store, ctx, cache)
    }

    #[test]
    fn anonymous_session_has_no_permissions() {
        let (_store, _ctx, cache) = setup();
        assert!(!cache.has_permission(permissions::PAYROLL_VIEW));
        assert_eq!(cache.role(), None);
        assert!(cache.permissions().is_empty());
    }

    #[test]
    fn login_is_reflected_without_waiting_for_the_timer() {
        let (_store, ctx, cache) = setup();
        assert!(!cache.has_permission(permissions::PAYROLL_VIEW));

        ctx.login(user(Role::Accountant)).unwrap();
        assert!(cache.has_permission(permissions::PAYROLL_VIEW));
        assert!(cache.has_role(Role::Accountant));

        ctx.logout().unwrap();
        assert!(!cache.has_permission(permissions::PAYROLL_VIEW));
        assert_eq!(cache.role(), None);
    }

    #[test]
    fn queries_are_idempotent_between_refreshes() {
        let (store, ctx, cache) = setup();
        ctx.login(user(Role::Employee)).unwrap();

        // A store mutation that bypasses the session context is not
        // visible until the next refresh.
        let first = cache.has_permission(permissions::ASSIGNMENT_VIEW);
        store.clear().unwrap();
        assert_eq!(cache.has_permission(permissions::ASSIGNMENT_VIEW), first);

        cache.refresh();
        assert!(!cache.has_permission(permissions::ASSIGNMENT_VIEW));
    }

    #[test]
    fn any_and_all_combinators() {
        let (_store, ctx, cache) = setup();
        ctx.login(user(Role::Accountant)).unwrap();

        assert!(cache.has_any_permission(&[
            permissions::USER_MANAGE,
            permissions::PAYROLL_VIEW,
        ]));
        assert!(cache.has_all_permissions(&[
            permissions::PAYROLL_VIEW,
            permissions::PAYROLL_MANAGE,
        ]));
        assert!(!cache.has_all_permissions(&[
            permissions::PAYROLL_VIEW,
            permissions::USER_MANAGE,
        ]));
        assert!(!cache.has_any_permission(&[]));
        assert!(cache.has_all_permissions(&[]));
    }

    #[tokio::test(start_paused = true)]
    async fn background_task_picks_up_out_of_band_changes() {
        let (store, ctx, cache) = setup();
        cache.start_refresh(Duration::from_millis(200));

        ctx.login(user(Role::Employee)).unwrap();
        assert!(cache.has_permission(permissions::ASSIGNMENT_VIEW));

        // Mutate the store directly: no session event fires, only the
        // polling task can observe this.
        store.clear().unwrap();
        assert!(cache.has_permission(permissions::ASSIGNMENT_VIEW));

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(!cache.has_permission(permissions::ASSIGNMENT_VIEW));
    }
}
