//! Organization Role Entity
//!
//! A named group of permissions (`user:create`, `user:delete`, ...).

use crate::domain::value_object::role_id::RoleId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRole {
    pub role_id: RoleId,
    pub name: String,
    pub permissions: Vec<String>,
}

impl OrganizationRole {
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role_id: RoleId::new(),
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// True if this role carries at least one of `allowed`
    pub fn grants_any<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        allowed
            .iter()
            .any(|p| self.permissions.iter().any(|own| own == p.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_any() {
        let role = OrganizationRole::new("user-admin", ["user:create", "user:delete"]);
        assert!(role.grants_any(&["user:delete"]));
        assert!(role.grants_any(&["report:read", "user:create"]));
        assert!(!role.grants_any(&["report:read"]));
        assert!(!role.grants_any::<&str>(&[]));
    }
}
