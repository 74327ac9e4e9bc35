//! User service: account creation, lookup and the authorization rules
//! around mutating other people's records.

use roster_config::ForbiddenPolicy;
use tracing::{debug, error, info, warn};

use super::avatar_service::AvatarGenerator;
use crate::entities::{Role, User};
use crate::repositories::UserRepo;
use crate::types::{RepositoryError, UserError, UserId, UserResult};
use crate::utils::password::{hash_password, verify_password};

/// Service for managing user operations.
///
/// Every call stands alone; the only shared state lives in the repository.
/// An actor may mutate a record when it is that record or an admin. What
/// happens otherwise depends on the [`ForbiddenPolicy`]: by default the call
/// reports success without touching anything.
#[derive(Debug, Clone)]
pub struct UserService<R, A> {
    repository: R,
    avatars: A,
    forbidden_policy: ForbiddenPolicy,
}

impl<R, A> UserService<R, A>
where
    R: UserRepo,
    A: AvatarGenerator,
{
    pub fn new(repository: R, avatars: A) -> Self {
        Self {
            repository,
            avatars,
            forbidden_policy: ForbiddenPolicy::default(),
        }
    }

    pub fn with_forbidden_policy(mut self, policy: ForbiddenPolicy) -> Self {
        self.forbidden_policy = policy;
        self
    }

    pub fn forbidden_policy(&self) -> ForbiddenPolicy {
        self.forbidden_policy
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Create a new user and return its id.
    ///
    /// Fails with `AlreadyExists` carrying the current owner's id when the
    /// email is taken.
    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> UserResult<UserId> {
        match self.repository.get_by_email(email).await {
            Ok(existing) => return Err(UserError::AlreadyExists { id: existing.id }),
            Err(RepositoryError::EmailNotFound { .. }) => {}
            Err(err) => return Err(translate("create_user", err)),
        }

        let avatar_url = self.avatars.generate().await.map_err(|err| {
            error!(error = %err, "avatar generation failed while creating user");
            UserError::Unexpected
        })?;

        let user = User {
            id: 0,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            avatar_url,
            role,
            banned: false,
        };

        let id = self
            .repository
            .create(user)
            .await
            .map_err(|err| translate("create_user", err))?;

        info!(user_id = id, %role, "created user");
        Ok(id)
    }

    pub async fn get_user(&self, id: UserId) -> UserResult<User> {
        self.repository
            .get(id)
            .await
            .map_err(|err| translate("get_user", err))
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.repository.get_all().await
    }

    /// Replace `target` on behalf of `actor_id`.
    ///
    /// Non-admin actors keep their stored role, so a self-update can never
    /// promote anyone.
    pub async fn update_user(&self, actor_id: UserId, mut target: User) -> UserResult<()> {
        let actor = self.load_actor("update_user", actor_id).await?;

        if target.id <= 0 {
            return Err(UserError::MissingTarget);
        }

        if !may_mutate(&actor, target.id) {
            return self.deny("update_user", actor.id, target.id);
        }

        if !actor.is_admin() {
            target.role = actor.role;
        }

        let target_id = target.id;
        self.repository
            .update(target)
            .await
            .map_err(|err| translate("update_user", err))?;

        info!(actor_id = actor.id, user_id = target_id, "updated user");
        Ok(())
    }

    pub async fn delete_user(&self, actor_id: UserId, target_id: UserId) -> UserResult<()> {
        let actor = self.load_actor("delete_user", actor_id).await?;

        if !may_mutate(&actor, target_id) {
            return self.deny("delete_user", actor.id, target_id);
        }

        self.repository
            .delete(target_id)
            .await
            .map_err(|err| translate("delete_user", err))?;

        warn!(actor_id = actor.id, user_id = target_id, "deleted user");
        Ok(())
    }

    /// Give `target_id` a fresh avatar. Authorization is the caller's job.
    pub async fn regenerate_avatar(&self, target_id: UserId) -> UserResult<()> {
        let user = self
            .repository
            .get(target_id)
            .await
            .map_err(|err| translate("regenerate_avatar", err))?;

        if user.is_immutable() {
            return Err(UserError::Unupdatable);
        }

        let avatar_url = self.avatars.generate().await.map_err(|err| {
            error!(error = %err, user_id = target_id, "avatar generation failed");
            UserError::Unexpected
        })?;

        self.repository
            .update_avatar(target_id, avatar_url)
            .await
            .map_err(|err| translate("regenerate_avatar", err))?;

        debug!(user_id = target_id, "regenerated avatar");
        Ok(())
    }

    /// Return the id owning `email` when `password` matches its stored hash.
    pub async fn check_credentials(&self, email: &str, password: &str) -> UserResult<UserId> {
        let user = self
            .repository
            .get_by_email(email)
            .await
            .map_err(|err| translate("check_credentials", err))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserError::WrongPassword);
        }

        Ok(user.id)
    }

    /// Set the role of `target_id`. Admin only, whatever the policy.
    pub async fn change_role(
        &self,
        actor_id: UserId,
        target_id: UserId,
        role: Role,
    ) -> UserResult<()> {
        let actor = self.load_actor("change_role", actor_id).await?;

        if !actor.is_admin() {
            warn!(actor_id = actor.id, user_id = target_id, "role change refused");
            return Err(UserError::Forbidden);
        }

        let target = self
            .repository
            .get(target_id)
            .await
            .map_err(|err| translate("change_role", err))?;

        if target.is_immutable() {
            return Err(UserError::Unupdatable);
        }

        let previous = target.role;
        self.repository
            .update_role(target_id, role)
            .await
            .map_err(|err| translate("change_role", err))?;

        info!(actor_id = actor.id, user_id = target_id, from = %previous, to = %role, "changed role");
        Ok(())
    }

    async fn load_actor(&self, operation: &'static str, actor_id: UserId) -> UserResult<User> {
        self.repository.get(actor_id).await.map_err(|err| match err {
            RepositoryError::NotFound { id } => {
                error!(operation, user_id = id, "requester not found");
                UserError::NotFound
            }
            other => translate(operation, other),
        })
    }

    fn deny(&self, operation: &'static str, actor_id: UserId, target_id: UserId) -> UserResult<()> {
        match self.forbidden_policy {
            ForbiddenPolicy::Silent => {
                debug!(operation, actor_id, user_id = target_id, "ignoring unauthorized request");
                Ok(())
            }
            ForbiddenPolicy::Reject => {
                warn!(operation, actor_id, user_id = target_id, "rejecting unauthorized request");
                Err(UserError::Forbidden)
            }
        }
    }
}

fn may_mutate(actor: &User, target_id: UserId) -> bool {
    actor.id == target_id || actor.is_admin()
}

/// Map a repository failure onto the opaque service error, logging whatever
/// detail the caller will not see.
fn translate(operation: &'static str, err: RepositoryError) -> UserError {
    match err {
        RepositoryError::NotFound { id } => {
            error!(operation, user_id = id, "user not found");
            UserError::NotFound
        }
        RepositoryError::EmailNotFound { email } => {
            error!(operation, %email, "user not found");
            UserError::NotFound
        }
        RepositoryError::Unupdatable { .. } => UserError::Unupdatable,
        RepositoryError::DuplicateEmail { id } => UserError::AlreadyExists { id },
        RepositoryError::Backend(message) => {
            error!(operation, error = %message, "unexpected repository error");
            UserError::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::repositories::InMemoryUserRepository;
    use crate::types::{AvatarError, AvatarResult, RepositoryResult};

    /// Hands out `avatar-1`, `avatar-2`, ...
    #[derive(Default)]
    struct CountingAvatars {
        calls: AtomicUsize,
    }

    impl AvatarGenerator for CountingAvatars {
        async fn generate(&self) -> AvatarResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("https://avatars.test/avatar-{n}"))
        }
    }

    struct FailingAvatars;

    impl AvatarGenerator for FailingAvatars {
        async fn generate(&self) -> AvatarResult<String> {
            Err(AvatarError::Generation("upstream down".into()))
        }
    }

    /// Every call fails with a backend error.
    struct BrokenRepository;

    impl UserRepo for BrokenRepository {
        async fn create(&self, _user: User) -> RepositoryResult<UserId> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn get(&self, _id: UserId) -> RepositoryResult<User> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn get_by_email(&self, _email: &str) -> RepositoryResult<User> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn update(&self, _user: User) -> RepositoryResult<()> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn update_avatar(&self, _id: UserId, _avatar_url: String) -> RepositoryResult<()> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn update_role(&self, _id: UserId, _role: Role) -> RepositoryResult<()> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn delete(&self, _id: UserId) -> RepositoryResult<()> {
            Err(RepositoryError::Backend("disk on fire".into()))
        }

        async fn get_all(&self) -> Vec<User> {
            Vec::new()
        }
    }

    fn service() -> UserService<InMemoryUserRepository, CountingAvatars> {
        UserService::new(InMemoryUserRepository::new(), CountingAvatars::default())
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_and_avatar() {
        let service = service();

        let id = service
            .create_user("John", "Doe", "johndoe@example.com", "123secure", Role::User)
            .await
            .unwrap();
        let user = service.get_user(id).await.unwrap();

        assert_eq!(user.email, "johndoe@example.com");
        assert_eq!(user.avatar_url, "https://avatars.test/avatar-1");
        assert_eq!(user.role, Role::User);
        assert!(!user.banned);
        assert_ne!(user.password_hash, "123secure");
    }

    #[tokio::test]
    async fn test_create_user_reports_existing_id() {
        let service = service();
        let id = service
            .create_user("A", "B", "dup@example.com", "pw", Role::User)
            .await
            .unwrap();

        let result = service
            .create_user("C", "D", "dup@example.com", "other", Role::Admin)
            .await;

        assert_eq!(result, Err(UserError::AlreadyExists { id }));
        assert_eq!(service.get_all_users().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_avatar_failure_is_unexpected() {
        let service = UserService::new(InMemoryUserRepository::new(), FailingAvatars);

        let result = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await;

        assert_eq!(result, Err(UserError::Unexpected));
        assert!(service.repository().is_empty().await);
    }

    #[tokio::test]
    async fn test_backend_errors_surface_as_unexpected() {
        let service = UserService::new(BrokenRepository, CountingAvatars::default());

        assert_eq!(service.get_user(1).await, Err(UserError::Unexpected));
        assert_eq!(
            service.create_user("A", "B", "a@example.com", "pw", Role::User).await,
            Err(UserError::Unexpected)
        );
        assert_eq!(service.delete_user(1, 1).await, Err(UserError::Unexpected));
        assert_eq!(
            service.check_credentials("a@example.com", "pw").await,
            Err(UserError::Unexpected)
        );
    }

    #[tokio::test]
    async fn test_unknown_actor_is_not_found() {
        let service = service();
        let id = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();
        let target = service.get_user(id).await.unwrap();

        assert_eq!(service.update_user(99, target).await, Err(UserError::NotFound));
        assert_eq!(service.delete_user(99, id).await, Err(UserError::NotFound));
        assert_eq!(
            service.change_role(99, id, Role::Admin).await,
            Err(UserError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_update_without_target_id_is_missing_target() {
        let service = service();
        let id = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();
        let mut target = service.get_user(id).await.unwrap();
        target.id = 0;

        assert_eq!(service.update_user(id, target).await, Err(UserError::MissingTarget));
    }

    #[tokio::test]
    async fn test_self_update_cannot_promote() {
        let service = service();
        let id = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();

        let mut target = service.get_user(id).await.unwrap();
        target.first_name = "Renamed".into();
        target.role = Role::Admin;
        service.update_user(id, target).await.unwrap();

        let stored = service.get_user(id).await.unwrap();
        assert_eq!(stored.first_name, "Renamed");
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_reports_owner() {
        let service = service();
        let owner = service
            .create_user("A", "B", "taken@example.com", "pw", Role::User)
            .await
            .unwrap();
        let id = service
            .create_user("C", "D", "mine@example.com", "pw", Role::User)
            .await
            .unwrap();

        let mut target = service.get_user(id).await.unwrap();
        target.email = "taken@example.com".into();

        assert_eq!(
            service.update_user(id, target).await,
            Err(UserError::AlreadyExists { id: owner })
        );
    }

    #[tokio::test]
    async fn test_reject_policy_turns_no_op_into_forbidden() {
        let service = service().with_forbidden_policy(ForbiddenPolicy::Reject);
        let first = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();
        let second = service
            .create_user("C", "D", "c@example.com", "pw", Role::User)
            .await
            .unwrap();

        let mut target = service.get_user(second).await.unwrap();
        target.first_name = "Hijacked".into();

        assert_eq!(service.update_user(first, target).await, Err(UserError::Forbidden));
        assert_eq!(service.delete_user(first, second).await, Err(UserError::Forbidden));
        assert_eq!(service.get_user(second).await.unwrap().first_name, "C");
    }

    #[tokio::test]
    async fn test_regenerate_avatar_replaces_url() {
        let service = service();
        let id = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();

        service.regenerate_avatar(id).await.unwrap();

        assert_eq!(
            service.get_user(id).await.unwrap().avatar_url,
            "https://avatars.test/avatar-2"
        );
        assert_eq!(service.regenerate_avatar(42).await, Err(UserError::NotFound));
    }

    #[tokio::test]
    async fn test_avatar_and_update_do_not_undo_each_other() {
        let service = service();
        let id = service
            .create_user("A", "B", "a@example.com", "pw", Role::User)
            .await
            .unwrap();

        let mut stale = service.get_user(id).await.unwrap();
        service.regenerate_avatar(id).await.unwrap();
        stale.first_name = "Renamed".into();
        service.update_user(id, stale).await.unwrap();

        let stored = service.get_user(id).await.unwrap();
        assert_eq!(stored.first_name, "Renamed");
        assert_eq!(stored.avatar_url, "https://avatars.test/avatar-2");

        let mut stale = service.get_user(id).await.unwrap();
        stale.last_name = "Changed".into();
        service.update_user(id, stale).await.unwrap();
        service.regenerate_avatar(id).await.unwrap();

        let stored = service.get_user(id).await.unwrap();
        assert_eq!(stored.last_name, "Changed");
        assert_eq!(stored.avatar_url, "https://avatars.test/avatar-3");
    }

    #[tokio::test]
    async fn test_immutable_avatar_is_not_generated() {
        let service = service();
        let id = service
            .create_user("F", "F", "f@example.com", "pw", Role::Immutable)
            .await
            .unwrap();

        assert_eq!(service.regenerate_avatar(id).await, Err(UserError::Unupdatable));
        assert_eq!(
            service.get_user(id).await.unwrap().avatar_url,
            "https://avatars.test/avatar-1"
        );
    }

    #[tokio::test]
    async fn test_check_credentials() {
        let service = service();
        let id = service
            .create_user("Foo", "Bar", "foo@bar.com", "psw1", Role::User)
            .await
            .unwrap();

        assert_eq!(service.check_credentials("foo@bar.com", "psw1").await, Ok(id));
        assert_eq!(
            service.check_credentials("foo@bar.com", "psw2").await,
            Err(UserError::WrongPassword)
        );
        assert_eq!(
            service.check_credentials("nobody@bar.com", "psw1").await,
            Err(UserError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_change_role_rules() {
        let service = service();
        let admin = service
            .create_user("A", "A", "admin@example.com", "pw", Role::Admin)
            .await
            .unwrap();
        let user = service
            .create_user("U", "U", "user@example.com", "pw", Role::User)
            .await
            .unwrap();
        let frozen = service
            .create_user("F", "F", "frozen@example.com", "pw", Role::Immutable)
            .await
            .unwrap();

        assert_eq!(
            service.change_role(user, user, Role::Admin).await,
            Err(UserError::Forbidden)
        );
        assert_eq!(
            service.change_role(admin, frozen, Role::User).await,
            Err(UserError::Unupdatable)
        );
        assert_eq!(
            service.change_role(admin, 77, Role::User).await,
            Err(UserError::NotFound)
        );

        service.change_role(admin, user, Role::Admin).await.unwrap();
        assert_eq!(service.get_user(user).await.unwrap().role, Role::Admin);
    }
}
