//! Staff account directory
//!
//! Backing store for the login flow only. Business entities (customers,
//! employees, contracts, ...) live behind the external service API; this
//! directory holds just the accounts that may sign in to the back office.

use crate::auth::Role;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Staff account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// In-memory account store
pub struct UserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    username_index: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            username_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new account
    pub async fn create(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let mut username_index = self.username_index.write().await;

        if username_index.contains_key(&user.username) {
            return Err(AppError::Conflict("Username already registered".to_string()));
        }

        username_index.insert(user.username.clone(), user.id);
        users.insert(user.id, user.clone());

        Ok(user)
    }

    /// Find account by username
    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        let username_index = self.username_index.read().await;
        let users = self.users.read().await;

        username_index
            .get(username)
            .and_then(|id| users.get(id).cloned())
    }

    /// Find account by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        let users = self.users.read().await;
        users.get(&id).cloned()
    }

    /// List all accounts
    pub async fn list(&self) -> Vec<User> {
        let mut list: Vec<User> = self.users.read().await.values().cloned().collect();
        list.sort_by(|a, b| a.username.cmp(&b.username));
        list
    }

    /// Seed one account per organizational role. Passwords come from
    /// SEED_PASSWORD, falling back to a dev-only default.
    pub async fn seed_defaults(&self) -> Result<(), AppError> {
        use crate::auth::hash_password;

        let password = std::env::var("SEED_PASSWORD")
            .unwrap_or_else(|_| "changeme-123".to_string());
        let password_hash = hash_password(&password)?;

        let accounts = [
            ("g.manager", "General Manager", Role::GeneralManager),
            ("d.manager", "Deputy General Manager", Role::DeputyGeneralManager),
            ("r.manager", "Regional Manager", Role::RegionalManager),
            ("accountant", "Accountant", Role::Accountant),
            ("employee", "Cleaning Staff", Role::Employee),
            ("customer", "Customer Account", Role::Customer),
        ];

        for (username, name, role) in accounts {
            let now = Utc::now();
            // Ignore conflicts when re-seeding an already-populated store.
            let _ = self
                .create(User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash: password_hash.clone(),
                    name: name.to_string(),
                    role,
                    created_at: now,
                })
                .await;
        }

        Ok(())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_directory_is_queryable() {
        tokio_test::block_on(async {
            let store = UserStore::new();
            store.seed_defaults().await.unwrap();

            let accountant = store
                .find_by_username("accountant")
                .await
                .expect("seeded account");
            assert_eq!(accountant.role, Role::Accountant);
            assert_eq!(store.find_by_id(accountant.id).await.unwrap().id, accountant.id);

            assert_eq!(store.list().await.len(), 6);
            assert!(store.find_by_username("nobody").await.is_none());
        });
    }

    #[test]
    fn duplicate_usernames_conflict() {
        tokio_test::block_on(async {
            let store = UserStore::new();
            store.seed_defaults().await.unwrap();
            // Re-seeding silently skips existing usernames.
            store.seed_defaults().await.unwrap();
            assert_eq!(store.list().await.len(), 6);
        });
    }
}
