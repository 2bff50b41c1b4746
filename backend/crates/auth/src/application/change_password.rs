//! Change Password Use Case

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::sign_in::verify_password;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    /// The existing session stays valid
    pub async fn execute(&self, mut user: User, input: ChangePasswordInput) -> AuthResult<()> {
        if !verify_password(user.password_hash.clone(), input.current_password).await? {
            return Err(AuthError::IncorrectCurrentPassword);
        }

        let password = ClearTextPassword::new(input.new_password)?;
        let algorithm = self.config.password_hash;
        let hash = tokio::task::spawn_blocking(move || password.hash(algorithm)).await??;

        user.set_password_hash(hash);
        self.user_repo
            .set_password_hash(&user.user_id, &user.password_hash, user.updated_at)
            .await?;

        tracing::info!(user_id = %user.user_id, "Password changed");
        Ok(())
    }
}
