//! Auth Middleware
//!
//! `authenticate` resolves the bearer token and stores the caller as
//! [`CurrentUser`] in request extensions. The permission and role layers run
//! after it and read that extension.

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use http::header::AUTHORIZATION;
use std::sync::Arc;

use crate::application::permission::{PermissionGuard, RoleGuard};
use crate::domain::entity::user::User;
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// The authenticated, active caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Require an active caller
pub async fn authenticate<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let token = bearer_token(req.headers())
        .ok_or(AuthError::MissingBearer)?
        .to_owned();

    let user = state.access_guard().resolve_active(&token).await?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// State for [`ensure_permissions`]
pub struct PermissionLayer<R> {
    pub repo: Arc<R>,
    pub guard: Arc<PermissionGuard>,
}

impl<R> PermissionLayer<R> {
    pub fn new<I, S>(repo: Arc<R>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repo,
            guard: Arc::new(PermissionGuard::new(allowed)),
        }
    }
}

impl<R> Clone for PermissionLayer<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            guard: self.guard.clone(),
        }
    }
}

/// Require an organization role granting one of the layer's permissions
pub async fn ensure_permissions<R>(
    State(layer): State<PermissionLayer<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    if let Err(e) = layer.guard.check(&layer.repo, &user).await {
        tracing::warn!(
            user_id = %user.user_id,
            required = %layer.guard.allowed().join(" "),
            path = %req.uri().path(),
            "Permission check failed"
        );
        return Err(e);
    }
    Ok(next.run(req).await)
}

/// Require one of the guard's flat roles
pub async fn ensure_roles(
    State(guard): State<Arc<RoleGuard>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    guard.check(&user)?;
    Ok(next.run(req).await)
}
