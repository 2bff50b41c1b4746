//! Create User Use Case
//!
//! Admin-side account creation. New accounts are active with the default
//! role.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::{PersonName, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Create user input
pub struct CreateUserInput {
    pub user_name: String,
    pub password: String,
    pub email: Option<String>,
    pub name: PersonName,
}

/// Create user use case
pub struct CreateUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> CreateUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: CreateUserInput) -> AuthResult<User> {
        let user_name = UserName::new(&input.user_name)?;
        let email = input.email.as_deref().map(Email::new).transpose()?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }

        let password = ClearTextPassword::new(input.password)?;
        let algorithm = self.config.password_hash;
        let password_hash = tokio::task::spawn_blocking(move || password.hash(algorithm)).await??;

        let user = User::new(user_name, password_hash, input.name).with_email(email);
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User created"
        );

        Ok(user)
    }
}
