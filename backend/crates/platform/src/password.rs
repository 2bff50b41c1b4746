//! Password Hashing and Verification
//!
//! - bcrypt hashing with a configurable work factor (default 14)
//! - Argon2id PHC hashes are accepted and can be produced on request
//! - NIST SP 800-63B input policy for newly chosen passwords
//! - Zeroization of clear text
//!
//! Verification never fails loudly: a malformed stored hash simply does not
//! match.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// NIST: SHALL be at least 8
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// NIST: SHOULD permit at least 64
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const DEFAULT_BCRYPT_COST: u32 = 14;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Hash algorithm selection
// ============================================================================

/// Algorithm used for new hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Bcrypt { cost: u32 },
    Argon2id,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Bcrypt {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, erased from memory on drop.
///
/// No `Clone`, and `Debug` is redacted.
///
/// ```rust
/// use platform::password::{ClearTextPassword, HashAlgorithm};
///
/// let password = ClearTextPassword::new("correct horse battery".to_string()).unwrap();
/// let hashed = password.hash(HashAlgorithm::Bcrypt { cost: 4 }).unwrap();
/// assert!(hashed.verify(&password));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Accept a newly chosen password.
    ///
    /// Unicode is normalized with NFKC, then checked against:
    /// - 8 to 128 code points
    /// - no control characters
    /// - not empty or whitespace only
    /// - not a well-known weak pattern
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Wrap a password presented at login.
    ///
    /// Only normalized; existing accounts may predate the policy.
    pub fn for_verification(raw: &str) -> Self {
        Self(raw.nfkc().collect())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with a fresh random salt
    pub fn hash(&self, algorithm: HashAlgorithm) -> Result<HashedPassword, PasswordHashError> {
        let hash = match algorithm {
            HashAlgorithm::Bcrypt { cost } => bcrypt::hash(self.as_bytes(), cost)
                .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?,
            HashAlgorithm::Argon2id => {
                let salt = SaltString::generate(OsRng);
                Argon2::default()
                    .hash_password(self.as_bytes(), &salt)
                    .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?
                    .to_string()
            }
        };

        Ok(HashedPassword { hash })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Stored password hash: bcrypt modular crypt (`$2b$14$...`) or an Argon2 PHC string
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Wrap a hash loaded from storage
    pub fn from_hash_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        let recognised = bcrypt_cost(&hash).is_some()
            || (hash.starts_with("$argon2") && PasswordHash::new(&hash).is_ok());
        if !recognised {
            return Err(PasswordHashError::InvalidHashFormat);
        }

        Ok(Self { hash })
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Constant-time verification (both backends compare in constant time)
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        if bcrypt_cost(&self.hash).is_some() {
            return bcrypt::verify(password.as_bytes(), &self.hash).unwrap_or(false);
        }

        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Check a password as typed at login
    ///
    /// The NFKC form is tried first. Hashes written from unnormalized bytes
    /// are still accepted through a second comparison on the raw input.
    pub fn verify_presented(&self, raw: &str) -> bool {
        let normalized = ClearTextPassword::for_verification(raw);
        if self.verify(&normalized) {
            return true;
        }
        normalized.0 != raw && self.verify(&ClearTextPassword(raw.to_owned()))
    }

    /// True when the stored hash was not produced with `target`
    pub fn needs_rehash(&self, target: HashAlgorithm) -> bool {
        match (bcrypt_cost(&self.hash), target) {
            (Some(cost), HashAlgorithm::Bcrypt { cost: wanted }) => cost != wanted,
            (Some(_), HashAlgorithm::Argon2id) => true,
            (None, HashAlgorithm::Argon2id) => match PasswordHash::new(&self.hash) {
                Ok(parsed) => parsed.algorithm != argon2::Algorithm::Argon2id.ident(),
                Err(_) => true,
            },
            (None, HashAlgorithm::Bcrypt { .. }) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Plain-string helpers
// ============================================================================

/// Hash a plaintext without applying the input policy
pub fn hash(plaintext: &str, algorithm: HashAlgorithm) -> Result<String, PasswordHashError> {
    ClearTextPassword::for_verification(plaintext)
        .hash(algorithm)
        .map(HashedPassword::into_string)
}

/// `false` for a mismatch and for anything that is not a recognised hash
pub fn verify(plaintext: &str, hash: &str) -> bool {
    match HashedPassword::from_hash_string(hash) {
        Ok(hashed) => hashed.verify_presented(plaintext),
        Err(_) => false,
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Cost of a `$2a$`/`$2b$`/`$2y$` hash, `None` for anything else
fn bcrypt_cost(hash: &str) -> Option<u32> {
    let mut parts = hash.split('$');
    if !parts.next()?.is_empty() {
        return None;
    }
    let version = parts.next()?;
    if !matches!(version, "2a" | "2b" | "2x" | "2y") {
        return None;
    }
    let cost = parts.next()?;
    let salt_and_hash = parts.next()?;
    if cost.len() != 2 || salt_and_hash.len() != 53 || parts.next().is_some() {
        return None;
    }
    cost.parse().ok()
}

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein1",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
    ];

    COMMON_PASSWORDS.contains(&lower.as_str())
}

fn is_sequential_numbers(s: &str) -> bool {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 {
        return false;
    }

    let ascending = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    let descending = digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10);

    ascending || descending
}

// ============================================================================
// Tests
// ============================================================================
