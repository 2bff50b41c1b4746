//! Request Extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::domain::entity::user::User;
use crate::domain::repository::AuthStore;
use crate::presentation::handlers::AuthAppState;
use crate::presentation::middleware::bearer_token;

/// Caller for optional-auth routes; never rejects
///
/// `None` for a missing, malformed, superseded or expired token, or an unknown
/// subject. Status is not checked.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

impl<R> FromRequestParts<AuthAppState<R>> for OptionalUser
where
    R: AuthStore,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthAppState<R>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        Ok(OptionalUser(state.access_guard().resolve_optional(token).await))
    }
}
