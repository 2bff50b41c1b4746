//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::entity::{
    organization_role::OrganizationRole,
    session::{Session, TokenPair},
    user::User,
};
use crate::domain::value_object::{
    role_id::RoleId, user_id::UserId, user_name::UserName, user_status::UserStatus,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; `UserNameTaken` if the user name exists
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    // Each write below touches only its own columns and fails with
    // `UserNotFound` when no row matches.

    /// Persist name and email fields of `user`
    async fn update_profile(&self, user: &User) -> AuthResult<()>;

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AuthResult<()>;

    async fn set_status(
        &self,
        user_id: &UserId,
        status: UserStatus,
        at: DateTime<Utc>,
    ) -> AuthResult<()>;
}

/// Session (token record) repository trait
///
/// At most one session exists per user.
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn find_session(&self, user_id: &UserId) -> AuthResult<Option<Session>>;

    /// Fails with `DuplicateSession` if the user already has one
    async fn create_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session>;

    /// Create or overwrite in place
    async fn upsert_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session>;
}

/// Organization role repository trait
#[trait_variant::make(OrganizationRoleRepository: Send)]
pub trait LocalOrganizationRoleRepository {
    /// Roles with the given ids; unknown ids are skipped
    async fn find_roles_by_ids(&self, role_ids: &[RoleId]) -> AuthResult<Vec<OrganizationRole>>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait AuthStore:
    UserRepository + SessionRepository + OrganizationRoleRepository + Clone + Send + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + SessionRepository
        + OrganizationRoleRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
