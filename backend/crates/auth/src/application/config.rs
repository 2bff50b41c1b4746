//! Application Configuration
//!
//! Built once at startup. Every invalid value is a configuration error and
//! must abort the process.

use std::fmt;

use chrono::{TimeDelta, Utc};
use platform::password::{DEFAULT_BCRYPT_COST, HashAlgorithm};

use crate::error::{AuthError, AuthResult};

/// Required length of `SECRET_KEY` (base64url of 32 bytes, unpadded)
pub const SECRET_KEY_LENGTH: usize = 43;

pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 10;
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES: i64 = 43_200;
/// 30 days × 24
pub const DEFAULT_LONG_LIFE_MULTIPLIER: i64 = 720;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared symmetric secret for signing and encrypting tokens
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_minutes: i64,
    /// Lifetime multiplier for long-life token pairs
    pub long_life_multiplier: i64,
    /// Algorithm for newly written password hashes
    pub password_hash: HashAlgorithm,
}

impl AuthConfig {
    /// Load from the process environment
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    ///
    /// | key | default |
    /// |-----|---------|
    /// | `SECRET_KEY` | required |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES` | 10 |
    /// | `REFRESH_TOKEN_EXPIRE_MINUTES` | 43200 |
    /// | `LONG_LIFE_TOKEN_MULTIPLIER` | 720 |
    /// | `PASSWORD_HASH_COST` | 14 |
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .ok_or_else(|| AuthError::Configuration("SECRET_KEY must be set".into()))?;

        let number = |key: &str, default: i64| -> AuthResult<i64> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => match raw.trim().parse::<i64>() {
                    Ok(value) if value > 0 => Ok(value),
                    _ => Err(AuthError::Configuration(format!(
                        "{key} must be a positive integer, got {raw:?}"
                    ))),
                },
            }
        };

        let cost = number("PASSWORD_HASH_COST", i64::from(DEFAULT_BCRYPT_COST))?;
        let cost = u32::try_from(cost)
            .ok()
            .filter(|c| (4..=31).contains(c))
            .ok_or_else(|| {
                AuthError::Configuration("PASSWORD_HASH_COST must be between 4 and 31".into())
            })?;

        let config = Self {
            secret_key,
            access_token_expire_minutes: number(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            )?,
            refresh_token_expire_minutes: number(
                "REFRESH_TOKEN_EXPIRE_MINUTES",
                DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES,
            )?,
            long_life_multiplier: number(
                "LONG_LIFE_TOKEN_MULTIPLIER",
                DEFAULT_LONG_LIFE_MULTIPLIER,
            )?,
            password_hash: HashAlgorithm::Bcrypt { cost },
        };
        config.validate()?;
        Ok(config)
    }

    /// Random secret and the lowest bcrypt cost, for local runs and tests
    pub fn development() -> Self {
        Self {
            secret_key: platform::crypto::generate_secret(),
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            refresh_token_expire_minutes: DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES,
            long_life_multiplier: DEFAULT_LONG_LIFE_MULTIPLIER,
            password_hash: HashAlgorithm::Bcrypt { cost: 4 },
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.secret_key.chars().count() != SECRET_KEY_LENGTH {
            return Err(AuthError::Configuration(format!(
                "SECRET_KEY length should be {SECRET_KEY_LENGTH}"
            )));
        }

        let now = Utc::now();
        for (name, minutes, multiplier) in [
            ("access token", self.access_token_expire_minutes, 1),
            ("refresh token", self.refresh_token_expire_minutes, 1),
            (
                "long-life access token",
                self.access_token_expire_minutes,
                self.long_life_multiplier,
            ),
            (
                "long-life refresh token",
                self.refresh_token_expire_minutes,
                self.long_life_multiplier,
            ),
        ] {
            let in_range = lifetime(minutes, multiplier)
                .and_then(|delta| now.checked_add_signed(delta))
                .is_some()
                && minutes
                    .checked_mul(60)
                    .and_then(|s| s.checked_mul(multiplier))
                    .is_some();
            if minutes <= 0 || multiplier <= 0 || !in_range {
                return Err(AuthError::Configuration(format!(
                    "{name} lifetime out of range ({minutes} minutes x {multiplier})"
                )));
            }
        }
        Ok(())
    }

    pub fn access_token_lifetime(&self) -> TimeDelta {
        saturating(lifetime(self.access_token_expire_minutes, 1))
    }

    pub fn refresh_token_lifetime(&self) -> TimeDelta {
        saturating(lifetime(self.refresh_token_expire_minutes, 1))
    }

    pub fn long_life_access_token_lifetime(&self) -> TimeDelta {
        saturating(lifetime(
            self.access_token_expire_minutes,
            self.long_life_multiplier,
        ))
    }

    pub fn long_life_refresh_token_lifetime(&self) -> TimeDelta {
        saturating(lifetime(
            self.refresh_token_expire_minutes,
            self.long_life_multiplier,
        ))
    }

    /// Seconds until a standard access token expires
    pub fn access_token_expires_in(&self) -> i64 {
        self.access_token_expire_minutes.saturating_mul(60)
    }

    /// Seconds until a long-life access token expires
    pub fn long_life_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in()
            .saturating_mul(self.long_life_multiplier)
    }
}

fn lifetime(minutes: i64, multiplier: i64) -> Option<TimeDelta> {
    minutes.checked_mul(multiplier).and_then(TimeDelta::try_minutes)
}

/// Unvalidated values saturate; issuing then fails with an out-of-range expiry
fn saturating(lifetime: Option<TimeDelta>) -> TimeDelta {
    lifetime.unwrap_or(TimeDelta::MAX)
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"[REDACTED]")
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field(
                "refresh_token_expire_minutes",
                &self.refresh_token_expire_minutes,
            )
            .field("long_life_multiplier", &self.long_life_multiplier)
            .field("password_hash", &self.password_hash)
            .finish()
    }
}
