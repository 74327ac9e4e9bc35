//! Data access layer for the user management system.
//!
//! [`UserRepo`] is the persistence boundary the user service is written
//! against. Implementations must make each call atomic: `create` assigns the
//! id and inserts in one step, and `update`/`delete` check existence and
//! mutate without another writer slipping in between. Field-level writers
//! (`update_avatar`, `update_role`) exist so a read-modify-write of the whole
//! record cannot undo a concurrent change to another field.

pub mod memory;

use std::future::Future;

use crate::entities::{Role, User};
use crate::types::{RepositoryResult, UserId};

pub use memory::InMemoryUserRepository;

/// Keyed store of user records.
pub trait UserRepo: Send + Sync {
    /// Insert `user`, ignoring its `id`, and return the freshly assigned id.
    /// Ids start at 1 and are never reused.
    fn create(&self, user: User) -> impl Future<Output = RepositoryResult<UserId>> + Send;

    fn get(&self, id: UserId) -> impl Future<Output = RepositoryResult<User>> + Send;

    fn get_by_email(&self, email: &str) -> impl Future<Output = RepositoryResult<User>> + Send;

    /// Replace the stored record with the same id. The stored avatar URL is
    /// kept; it only changes through [`update_avatar`](UserRepo::update_avatar).
    /// Fails with `Unupdatable` when the stored record is immutable.
    fn update(&self, user: User) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Set only the avatar URL of record `id`.
    fn update_avatar(
        &self,
        id: UserId,
        avatar_url: String,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Set only the role of record `id`.
    fn update_role(&self, id: UserId, role: Role) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn delete(&self, id: UserId) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn get_all(&self) -> impl Future<Output = Vec<User>> + Send;
}
