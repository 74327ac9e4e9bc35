//! In-memory user repository, used for local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::UserRepo;
use crate::entities::{Role, User};
use crate::types::{RepositoryError, RepositoryResult, UserId};

#[derive(Debug, Default)]
struct Store {
    users: HashMap<UserId, User>,
    email_index: HashMap<String, UserId>,
    last_id: UserId,
}

/// A [`UserRepo`] backed by a hash map behind a single lock.
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// The stored record `id`, unless it is missing or immutable.
fn writable(store: &mut Store, id: UserId) -> RepositoryResult<&mut User> {
    let user = store
        .users
        .get_mut(&id)
        .ok_or(RepositoryError::NotFound { id })?;

    if user.role == Role::Immutable {
        return Err(RepositoryError::Unupdatable { id });
    }
    Ok(user)
}

impl UserRepo for InMemoryUserRepository {
    async fn create(&self, mut user: User) -> RepositoryResult<UserId> {
        let mut store = self.store.write().await;

        if let Some(&id) = store.email_index.get(&user.email) {
            return Err(RepositoryError::DuplicateEmail { id });
        }

        store.last_id += 1;
        let id = store.last_id;
        user.id = id;

        store.email_index.insert(user.email.clone(), id);
        store.users.insert(id, user);

        Ok(id)
    }

    async fn get(&self, id: UserId) -> RepositoryResult<User> {
        let store = self.store.read().await;
        store
            .users
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound { id })
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        let store = self.store.read().await;
        store
            .email_index
            .get(email)
            .and_then(|id| store.users.get(id))
            .cloned()
            .ok_or_else(|| RepositoryError::EmailNotFound {
                email: email.to_string(),
            })
    }

    async fn update(&self, mut user: User) -> RepositoryResult<()> {
        let mut store = self.store.write().await;

        let existing = writable(&mut store, user.id)?;
        user.avatar_url = existing.avatar_url.clone();
        let old_email = existing.email.clone();

        if old_email != user.email {
            if let Some(&owner) = store.email_index.get(&user.email) {
                return Err(RepositoryError::DuplicateEmail { id: owner });
            }
            store.email_index.remove(&old_email);
            store.email_index.insert(user.email.clone(), user.id);
        }

        store.users.insert(user.id, user);
        Ok(())
    }

    async fn update_avatar(&self, id: UserId, avatar_url: String) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        writable(&mut store, id)?.avatar_url = avatar_url;
        Ok(())
    }

    async fn update_role(&self, id: UserId, role: Role) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        writable(&mut store, id)?.role = role;
        Ok(())
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<()> {
        let mut store = self.store.write().await;

        let user = store
            .users
            .remove(&id)
            .ok_or(RepositoryError::NotFound { id })?;
        store.email_index.remove(&user.email);

        Ok(())
    }

    async fn get_all(&self) -> Vec<User> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        users
    }
}
