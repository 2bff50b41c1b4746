//! User Entity

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{
    email::Email, role_id::RoleId, user_id::UserId, user_name::UserName, user_status::UserStatus,
};

/// Role every new account starts with
pub const DEFAULT_ROLE: &str = "user";

/// User entity
///
/// The password hash never leaves the application layer; response views are
/// built from the public fields only.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique login handle
    pub user_name: UserName,
    pub password_hash: HashedPassword,
    pub user_status: UserStatus,
    /// Flat role names (`["user"]` by default)
    pub roles: Vec<String>,
    /// Organization roles, each carrying a permission set
    pub organization_role_ids: Vec<RoleId>,
    pub email: Option<Email>,
    pub title_name: String,
    pub first_name: String,
    pub last_name: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Personal name fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub title_name: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn new(user_name: UserName, password_hash: HashedPassword, name: PersonName) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            password_hash,
            user_status: UserStatus::default(),
            roles: vec![DEFAULT_ROLE.to_string()],
            organization_role_ids: Vec::new(),
            email: None,
            title_name: name.title_name,
            first_name: name.first_name,
            last_name: name.last_name,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: Option<Email>) -> Self {
        self.email = email;
        self
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.user_status.can_login()
    }

    pub fn deactivate(&mut self) {
        self.user_status = UserStatus::Disactive;
        self.updated_at = Utc::now();
    }

    pub fn rename(&mut self, name: PersonName) {
        self.title_name = name.title_name;
        self.first_name = name.first_name;
        self.last_name = name.last_name;
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }

    /// True if any of `required` is one of the user's flat roles
    pub fn has_any_role<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .any(|role| self.roles.iter().any(|own| own == role.as_ref()))
    }
}
