//! Permission and Role Guards
//!
//! Built once with the accepted names, checked per request against an already
//! resolved user. Organization roles are read at check time so permission
//! edits apply immediately.

use std::sync::Arc;

use crate::application::access_guard::INACTIVE_USER;
use crate::domain::entity::user::User;
use crate::domain::repository::OrganizationRoleRepository;
use crate::error::{AuthError, AuthResult};

pub const MISSING_PERMISSION: &str = "User is not role permission";

/// Accepts a user if any of their organization roles grants any listed permission
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    allowed: Vec<String>,
}

impl PermissionGuard {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub async fn check<R>(&self, roles: &Arc<R>, user: &User) -> AuthResult<()>
    where
        R: OrganizationRoleRepository,
    {
        if user.organization_role_ids.is_empty() {
            return Err(AuthError::PermissionDenied(MISSING_PERMISSION.into()));
        }

        let granted = roles
            .find_roles_by_ids(&user.organization_role_ids)
            .await?
            .iter()
            .any(|role| role.grants_any(&self.allowed));

        if granted {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(MISSING_PERMISSION.into()))
        }
    }
}

/// Accepts an active user holding any listed flat role
#[derive(Debug, Clone)]
pub struct RoleGuard {
    required: Vec<String>,
}

impl RoleGuard {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(&self, user: &User) -> AuthResult<()> {
        if !user.is_active() {
            return Err(AuthError::PermissionDenied(INACTIVE_USER.into()));
        }
        if user.has_any_role(&self.required) {
            return Ok(());
        }
        // An empty list matches nobody
        let last = self.required.last().map(String::as_str).unwrap_or_default();
        Err(AuthError::PermissionDenied(format!("User is not role {last}")))
    }
}
