//! User Name Value Object
//!
//! The login handle. Matching is exact after NFKC normalization and trimming,
//! so `alice` and `Alice` are different accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::error::AuthError;

pub const USER_NAME_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: &str) -> Result<Self, AuthError> {
        let normalized: String = raw.nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(AuthError::InvalidInput("Username cannot be empty".into()));
        }
        if trimmed.chars().count() > USER_NAME_MAX_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Username must be at most {USER_NAME_MAX_LENGTH} characters"
            )));
        }
        if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(AuthError::InvalidInput(
                "Username cannot contain whitespace or control characters".into(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Rebuild from a stored value without validation
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_normalizes() {
        assert_eq!(UserName::new("  alice ").unwrap().as_str(), "alice");
        // FULLWIDTH "ａｌｉｃｅ"
        assert_eq!(
            UserName::new("\u{FF41}\u{FF4C}\u{FF49}\u{FF43}\u{FF45}")
                .unwrap()
                .as_str(),
            "alice"
        );
    }

    #[test]
    fn test_case_is_preserved() {
        assert_ne!(UserName::new("Alice").unwrap(), UserName::new("alice").unwrap());
    }

    #[test]
    fn test_rejections() {
        assert!(UserName::new("   ").is_err());
        assert!(UserName::new("al ice").is_err());
        assert!(UserName::new(&"a".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
    }
}
