//! Access Guard
//!
//! Resolves a bearer token to the user it was issued for. A token is honoured
//! only while it is the access token of that user's stored session.

use std::sync::Arc;

use chrono::Utc;

use crate::application::token::TokenCodec;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub const INACTIVE_USER: &str = "Inactive user";

pub struct AccessGuard<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    codec: Arc<TokenCodec>,
}

impl<U, S> AccessGuard<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, codec: Arc<TokenCodec>) -> Self {
        Self {
            user_repo,
            session_repo,
            codec,
        }
    }

    /// Resolve the token's user regardless of status
    pub async fn resolve(&self, token: &str) -> AuthResult<User> {
        let claims = self
            .codec
            .decode_claims(token)
            .ok_or(AuthError::CouldNotValidateCredentials)?;

        let session = self
            .session_repo
            .find_session(&claims.id)
            .await?
            .ok_or(AuthError::CouldNotValidateCredentials)?;

        // Superseded by a later login or refresh, or simply expired
        if !session.matches_access_exp(claims.exp)
            || session.tokens.access_token != token
            || claims.exp < Utc::now().timestamp()
        {
            return Err(AuthError::CouldNotValidateCredentials);
        }

        self.user_repo
            .find_by_id(&claims.id)
            .await?
            .ok_or(AuthError::TokenSubjectNotFound)
    }

    /// Resolve and require an active account
    pub async fn resolve_active(&self, token: &str) -> AuthResult<User> {
        let user = self.resolve(token).await?;
        if !user.is_active() {
            return Err(AuthError::PermissionDenied(INACTIVE_USER.into()));
        }
        Ok(user)
    }

    /// Soft variant for optional authentication: every failure is `None`
    pub async fn resolve_optional(&self, token: Option<&str>) -> Option<User> {
        let token = token?;
        match self.resolve(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Optional authentication ignored");
                None
            }
        }
    }
}
