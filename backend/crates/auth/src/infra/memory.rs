//! In-Memory Repository Implementation
//!
//! Same contracts as the PostgreSQL repository, held in process. Used by the
//! test suite and database-less local runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use tokio::sync::RwLock;

use crate::domain::entity::{
    organization_role::OrganizationRole,
    session::{Session, TokenPair},
    user::User,
};
use crate::domain::repository::{OrganizationRoleRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{
    role_id::RoleId, user_id::UserId, user_name::UserName, user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    sessions: HashMap<UserId, Session>,
    roles: HashMap<RoleId, OrganizationRole>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<RwLock<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_role(&self, role: OrganizationRole) {
        self.state.write().await.roles.insert(role.role_id, role);
    }

    /// Insert or replace without the uniqueness check
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.user_id, user);
    }

    async fn modify<F>(&self, user_id: &UserId, apply: F) -> AuthResult<()>
    where
        F: FnOnce(&mut User),
    {
        match self.state.write().await.users.get_mut(user_id) {
            Some(stored) => {
                apply(stored);
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|existing| existing.user_name == user.user_name)
        {
            return Err(AuthError::UserNameTaken);
        }
        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| &user.user_name == user_name)
            .cloned())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .any(|user| &user.user_name == user_name))
    }

    async fn update_profile(&self, user: &User) -> AuthResult<()> {
        self.modify(&user.user_id, |stored| {
            stored.email = user.email.clone();
            stored.title_name = user.title_name.clone();
            stored.first_name = user.first_name.clone();
            stored.last_name = user.last_name.clone();
            stored.updated_at = user.updated_at;
        })
        .await
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        self.modify(user_id, |stored| {
            stored.last_login_at = Some(at);
            stored.updated_at = at;
        })
        .await
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.modify(user_id, |stored| {
            stored.password_hash = password_hash.clone();
            stored.updated_at = at;
        })
        .await
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: UserStatus,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.modify(user_id, |stored| {
            stored.user_status = status;
            stored.updated_at = at;
        })
        .await
    }
}

impl SessionRepository for MemoryAuthRepository {
    async fn find_session(&self, user_id: &UserId) -> AuthResult<Option<Session>> {
        Ok(self.state.read().await.sessions.get(user_id).cloned())
    }

    async fn create_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session> {
        let mut state = self.state.write().await;
        if state.sessions.contains_key(user_id) {
            return Err(AuthError::DuplicateSession);
        }
        let session = Session::new(*user_id, tokens.clone());
        state.sessions.insert(*user_id, session.clone());
        Ok(session)
    }

    async fn upsert_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session> {
        let session = Session::new(*user_id, tokens.clone());
        self.state
            .write()
            .await
            .sessions
            .insert(*user_id, session.clone());
        Ok(session)
    }
}

impl OrganizationRoleRepository for MemoryAuthRepository {
    async fn find_roles_by_ids(&self, role_ids: &[RoleId]) -> AuthResult<Vec<OrganizationRole>> {
        let state = self.state.read().await;
        Ok(role_ids
            .iter()
            .filter_map(|id| state.roles.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(tag: &str, exp: i64) -> TokenPair {
        let at: DateTime<Utc> = DateTime::from_timestamp(exp, 0).unwrap();
        TokenPair {
            access_token: format!("{tag}-access"),
            access_token_expires: at,
            refresh_token: format!("{tag}-refresh"),
            refresh_token_expires: at,
        }
    }

    #[tokio::test]
    async fn test_create_session_rejects_duplicate() {
        let repo = MemoryAuthRepository::new();
        let user_id = UserId::new();

        repo.create_session(&user_id, &pair("first", 100)).await.unwrap();
        let err = repo
            .create_session(&user_id, &pair("second", 200))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::DuplicateSession));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let repo = MemoryAuthRepository::new();
        let user_id = UserId::new();

        repo.upsert_session(&user_id, &pair("first", 100)).await.unwrap();
        repo.upsert_session(&user_id, &pair("second", 200)).await.unwrap();

        let session = repo.find_session(&user_id).await.unwrap().unwrap();
        assert_eq!(session.tokens.access_token, "second-access");
        assert!(session.matches_refresh_exp(200));
    }

    fn user(name: &str) -> User {
        let hash = platform::password::hash(
            "secret1",
            platform::password::HashAlgorithm::Bcrypt { cost: 4 },
        )
        .unwrap();
        User::new(
            UserName::new(name).unwrap(),
            HashedPassword::from_hash_string(hash).unwrap(),
            Default::default(),
        )
    }

    #[tokio::test]
    async fn test_field_writes_leave_other_columns_alone() {
        let repo = MemoryAuthRepository::new();
        let user = user("alice");
        repo.insert_user(user.clone()).await;

        let later = Utc::now();
        repo.set_status(&user.user_id, UserStatus::Disactive, later)
            .await
            .unwrap();
        repo.record_login(&user.user_id, later).await.unwrap();

        // A stale snapshot written back as a profile update keeps the new status
        let mut stale = user.clone();
        stale.first_name = "Alicia".into();
        repo.update_profile(&stale).await.unwrap();

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.user_status, UserStatus::Disactive);
        assert_eq!(stored.last_login_at, Some(later));
        assert_eq!(stored.first_name, "Alicia");
    }

    #[tokio::test]
    async fn test_field_writes_on_unknown_user() {
        let repo = MemoryAuthRepository::new();
        let err = repo.record_login(&UserId::new(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_unknown_role_ids_are_skipped() {
        let repo = MemoryAuthRepository::new();
        let role = OrganizationRole::new("admin", ["user:create"]);
        let known = role.role_id;
        repo.insert_role(role).await;

        let roles = repo.find_roles_by_ids(&[known, RoleId::new()]).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "admin");
    }
}
