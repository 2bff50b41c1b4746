//! Token Codec
//!
//! A token is an HS256 JWS over the claims, carried as the plaintext of a
//! compact JWE (`A256KW` / `A256CBC-HS512`). Both layers use the same 32-byte
//! key, supplied as a 43-character base64url secret.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use platform::crypto::from_base64url;
use platform::jwe::{Jwe, JweError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::config::SECRET_KEY_LENGTH;
use crate::domain::entity::{session::TokenPair, user::User};
use crate::domain::value_object::user_id::UserId;

pub type Claims = Map<String, Value>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("{0}")]
    InvalidSecret(String),

    #[error("Signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Signature rejected: {0}")]
    Signature(jsonwebtoken::errors::Error),

    #[error(transparent)]
    Jwe(#[from] JweError),

    #[error("Inner token is not UTF-8")]
    NotUtf8,

    #[error("Expiry out of range")]
    ExpiryOutOfRange,
}

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, epoch seconds
    pub exp: i64,
    pub id: UserId,
    pub roles: Vec<String>,
}

impl TokenClaims {
    pub fn for_user(user: &User, exp: i64) -> Self {
        Self {
            exp,
            id: user.user_id,
            roles: user.roles.clone(),
        }
    }
}

pub struct TokenCodec {
    jwe: Jwe,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Fails unless `secret` is exactly 43 characters of base64url encoding 32 bytes
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.len() != SECRET_KEY_LENGTH {
            return Err(TokenError::InvalidSecret(format!(
                "SECRET_KEY length should be {SECRET_KEY_LENGTH}"
            )));
        }
        let key: [u8; 32] = from_base64url(secret)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                TokenError::InvalidSecret("SECRET_KEY must be base64url of 32 bytes".into())
            })?;

        // Expiry is checked against the stored session, not here.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            jwe: Jwe::new(key),
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            validation,
        })
    }

    /// Sign then encrypt
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let signed = jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;
        Ok(self.jwe.encrypt(signed.as_bytes())?)
    }

    /// `None` on any failure: malformed input, bad tag, bad signature, non-JSON claims
    pub fn decode(&self, token: &str) -> Option<Claims> {
        match self.try_decode(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                None
            }
        }
    }

    pub fn try_decode(&self, token: &str) -> Result<Claims, TokenError> {
        let inner = self.jwe.decrypt(token)?;
        let inner = std::str::from_utf8(&inner).map_err(|_| TokenError::NotUtf8)?;
        let data = jsonwebtoken::decode::<Claims>(inner, &self.decoding_key, &self.validation)
            .map_err(TokenError::Signature)?;
        Ok(data.claims)
    }

    /// Typed view of [`Self::decode`]; claims missing `exp`, `id` or `roles` are rejected
    pub fn decode_claims(&self, token: &str) -> Option<TokenClaims> {
        let claims = self.decode(token)?;
        serde_json::from_value(Value::Object(claims)).ok()
    }

    /// Issue an access/refresh pair for `user`, each token carrying its own `exp`
    pub fn issue_pair(
        &self,
        user: &User,
        access_lifetime: TimeDelta,
        refresh_lifetime: TimeDelta,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        let (access_token, access_token_expires) = self.issue_one(user, now, access_lifetime)?;
        let (refresh_token, refresh_token_expires) = self.issue_one(user, now, refresh_lifetime)?;

        Ok(TokenPair {
            access_token,
            access_token_expires,
            refresh_token,
            refresh_token_expires,
        })
    }

    fn issue_one(
        &self,
        user: &User,
        now: DateTime<Utc>,
        lifetime: TimeDelta,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        // Second precision so the stored expiry equals the `exp` claim.
        let exp = now
            .checked_add_signed(lifetime)
            .ok_or(TokenError::ExpiryOutOfRange)?
            .timestamp();
        let expires = DateTime::from_timestamp(exp, 0).ok_or(TokenError::ExpiryOutOfRange)?;
        let token = self.encode(&TokenClaims::for_user(user, exp))?;
        Ok((token, expires))
    }
}
