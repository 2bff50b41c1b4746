//! Token Session Entity
//!
//! One row per user holding the only token pair currently honoured for that
//! user. Every login, sign-in, long-life issuance and refresh overwrites it.

use chrono::{DateTime, Utc};

use crate::domain::value_object::user_id::UserId;

/// Freshly issued tokens with absolute, second-precision expiries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub access_token_expires: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires: DateTime<Utc>,
}

/// Stored session; its expiries are the source of truth for token validity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub tokens: TokenPair,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, tokens: TokenPair) -> Self {
        Self {
            user_id,
            tokens,
            updated_at: Utc::now(),
        }
    }

    /// `exp` claim of an access token matches the stored access expiry
    pub fn matches_access_exp(&self, exp: i64) -> bool {
        self.tokens.access_token_expires.timestamp() == exp
    }

    /// `exp` claim of a refresh token matches the stored refresh expiry
    pub fn matches_refresh_exp(&self, exp: i64) -> bool {
        self.tokens.refresh_token_expires.timestamp() == exp
    }
}
