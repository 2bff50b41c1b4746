//! Sign In Use Case
//!
//! Checks credentials, issues a fresh token pair and makes it the user's only
//! session. Also issues long-life pairs for an already authenticated user.

use std::sync::Arc;

use platform::password::{ClearTextPassword, HashedPassword};

use crate::application::config::AuthConfig;
use crate::application::token::TokenCodec;
use crate::domain::entity::{session::TokenPair, user::User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub user_name: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub tokens: TokenPair,
    /// Seconds until the access token expires
    pub access_token_expires_in: i64,
}

/// Sign in use case
pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        codec: Arc<TokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            codec,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        // A name that cannot exist is reported like an unknown one
        let user_name =
            UserName::new(&input.user_name).map_err(|_| AuthError::IncorrectCredentials)?;

        let mut user = self
            .user_repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(AuthError::IncorrectCredentials)?;

        if !user.is_active() {
            return Err(AuthError::AccountInactive);
        }

        if !verify_password(user.password_hash.clone(), input.password.clone()).await? {
            return Err(AuthError::IncorrectCredentials);
        }

        if user.password_hash.needs_rehash(self.config.password_hash) {
            match rehash_password(input.password, &self.config).await {
                Ok(hash) => {
                    user.set_password_hash(hash);
                    self.user_repo
                        .set_password_hash(&user.user_id, &user.password_hash, user.updated_at)
                        .await?;
                }
                Err(e) => tracing::warn!(error = %e, "Password rehash failed, keeping old hash"),
            }
        }

        user.record_login();
        self.user_repo
            .record_login(&user.user_id, user.updated_at)
            .await?;

        let tokens = self.codec.issue_pair(
            &user,
            self.config.access_token_lifetime(),
            self.config.refresh_token_lifetime(),
        )?;
        self.session_repo.upsert_session(&user.user_id, &tokens).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User signed in"
        );

        Ok(SignInOutput {
            user,
            tokens,
            access_token_expires_in: self.config.access_token_expires_in(),
        })
    }

    /// Issue a long-life pair for `user_id`, replacing the current session
    pub async fn issue_long_life(&self, user_id: &UserId) -> AuthResult<SignInOutput> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::TokenSubjectNotFound)?;

        if !user.is_active() {
            return Err(AuthError::AccountInactive);
        }

        let tokens = self.codec.issue_pair(
            &user,
            self.config.long_life_access_token_lifetime(),
            self.config.long_life_refresh_token_lifetime(),
        )?;
        self.session_repo.upsert_session(&user.user_id, &tokens).await?;

        tracing::info!(user_id = %user.user_id, "Long-life token issued");

        Ok(SignInOutput {
            user,
            tokens,
            access_token_expires_in: self.config.long_life_access_token_expires_in(),
        })
    }
}

/// bcrypt is CPU-bound; keep it off the async workers
pub(crate) async fn verify_password(hash: HashedPassword, password: String) -> AuthResult<bool> {
    let valid = tokio::task::spawn_blocking(move || hash.verify_presented(&password)).await?;
    Ok(valid)
}

async fn rehash_password(password: String, config: &AuthConfig) -> AuthResult<HashedPassword> {
    let algorithm = config.password_hash;
    let hash = tokio::task::spawn_blocking(move || {
        ClearTextPassword::for_verification(&password).hash(algorithm)
    })
    .await??;
    Ok(hash)
}
