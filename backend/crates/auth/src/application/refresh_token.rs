//! Refresh Token Use Case
//!
//! Exchanges the current refresh token for a new pair. Only the refresh token
//! of the stored session is accepted, so each one works at most once.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenCodec;
use crate::domain::entity::session::TokenPair;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

/// Refresh input
pub struct RefreshTokenInput {
    pub grant_type: String,
    pub refresh_token: String,
}

/// Refresh token use case
pub struct RefreshTokenUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, S> RefreshTokenUseCase<U, S>
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

    pub async fn execute(&self, input: RefreshTokenInput) -> AuthResult<TokenPair> {
        if input.grant_type != REFRESH_GRANT_TYPE {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let claims = self
            .codec
            .decode_claims(&input.refresh_token)
            .ok_or(AuthError::CouldNotValidateCredentials)?;

        let user = self
            .user_repo
            .find_by_id(&claims.id)
            .await?
            .ok_or(AuthError::TokenSubjectNotFound)?;

        let session = self
            .session_repo
            .find_session(&user.user_id)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if claims.exp < Utc::now().timestamp()
            || !session.matches_refresh_exp(claims.exp)
            || session.tokens.refresh_token != input.refresh_token
        {
            tracing::debug!(user_id = %user.user_id, "Stale or superseded refresh token");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        // Roles come from the current record, not the old token
        let tokens = self.codec.issue_pair(
            &user,
            self.config.access_token_lifetime(),
            self.config.refresh_token_lifetime(),
        )?;
        self.session_repo.upsert_session(&user.user_id, &tokens).await?;

        tracing::info!(user_id = %user.user_id, "Token pair refreshed");

        Ok(tokens)
    }
}
