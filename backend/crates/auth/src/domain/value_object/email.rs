//! Email Value Object
//!
//! Optional contact address on a user. Format checks only.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(email: &str) -> Result<Self, AuthError> {
        let email = email.trim().to_lowercase();

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Email must be at most {EMAIL_MAX_LENGTH} characters"
            )));
        }
        if !Self::is_valid_format(&email) {
            return Err(AuthError::InvalidInput("Invalid email format".into()));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        !domain.is_empty()
            && domain.contains('.')
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
            && !domain.starts_with(['.', '-'])
            && !domain.ends_with(['.', '-'])
    }

    /// Rebuild from a stored value without validation
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_lowercased() {
        assert_eq!(
            Email::new(" Alice@Example.COM ").unwrap().as_str(),
            "alice@example.com"
        );
    }

    #[test]
    fn test_invalid_emails() {
        for bad in ["", "alice", "@example.com", "a@b@c.com", "a@example", "a@-example.com"] {
            assert!(Email::new(bad).is_err(), "{bad} should be rejected");
        }
    }
}
