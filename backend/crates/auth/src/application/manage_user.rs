//! Manage User Use Case
//!
//! Read, update and soft-deactivate a single user. Users are never removed.

use std::sync::Arc;

use crate::domain::entity::user::{PersonName, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Field changes for an update
///
/// `None` keeps the current value. A full replacement sets every field.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub title_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` clears the email
    pub email: Option<Option<String>>,
}

impl UserChanges {
    /// Every field set; missing name parts become empty and a missing email is cleared
    pub fn replace_all(name: PersonName, email: Option<String>) -> Self {
        Self {
            title_name: Some(name.title_name),
            first_name: Some(name.first_name),
            last_name: Some(name.last_name),
            email: Some(email),
        }
    }
}

pub struct ManageUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ManageUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn get(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update(&self, user_id: &UserId, changes: UserChanges) -> AuthResult<User> {
        let mut user = self.get(user_id).await?;

        let email = match changes.email {
            None => user.email.clone(),
            Some(None) => None,
            Some(Some(raw)) => Some(Email::new(&raw)?),
        };

        let name = PersonName {
            title_name: changes.title_name.unwrap_or_else(|| user.title_name.clone()),
            first_name: changes.first_name.unwrap_or_else(|| user.first_name.clone()),
            last_name: changes.last_name.unwrap_or_else(|| user.last_name.clone()),
        };
        user.rename(name);
        user.email = email;

        self.user_repo.update_profile(&user).await?;
        tracing::info!(user_id = %user.user_id, "User updated");

        Ok(user)
    }

    /// Flip status to `disactive`; the caller's guard decides who may do this
    pub async fn deactivate(&self, user_id: &UserId) -> AuthResult<User> {
        let mut user = self.get(user_id).await?;
        user.deactivate();

        self.user_repo
            .set_status(&user.user_id, user.user_status, user.updated_at)
            .await?;
        tracing::info!(user_id = %user.user_id, "User deactivated");

        Ok(user)
    }
}
