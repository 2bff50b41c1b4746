//! API DTOs (Data Transfer Objects)
//!
//! Wire names are snake_case. No response type carries a password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::sign_in::SignInOutput;
use crate::domain::entity::{session::TokenPair, user::User};
use crate::domain::value_object::{user_id::UserId, user_status::UserStatus};

pub const TOKEN_TYPE: &str = "bearer";

// ============================================================================
// Sign In
// ============================================================================

/// JSON sign in request
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// OAuth2 password-grant form (`application/x-www-form-urlencoded`)
///
/// Other grant fields (`scope`, `grant_type`, client credentials) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Profile returned alongside fresh tokens
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub title_name: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub last_login_date: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            username: user.user_name.to_string(),
            email: user.email.as_ref().map(|e| e.as_str().to_string()),
            title_name: user.title_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            status: user.user_status,
            last_login_date: user.last_login_at,
        }
    }
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub user_info: UserResponse,
    pub access_token: String,
    pub access_token_expires: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires: DateTime<Utc>,
    /// Seconds
    pub access_token_expires_in: i64,
    pub token_type: &'static str,
}

impl From<SignInOutput> for SignInResponse {
    fn from(output: SignInOutput) -> Self {
        let tokens = output.tokens;
        Self {
            user_info: UserResponse::from(&output.user),
            access_token: tokens.access_token,
            access_token_expires: tokens.access_token_expires,
            refresh_token: tokens.refresh_token,
            refresh_token_expires: tokens.refresh_token_expires,
            access_token_expires_in: output.access_token_expires_in,
            token_type: TOKEN_TYPE,
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub grant_type: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub access_token_expires: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires: DateTime<Utc>,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            access_token_expires: tokens.access_token_expires,
            refresh_token: tokens.refresh_token,
            refresh_token_expires: tokens.refresh_token_expires,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// User detail, including flat roles
#[derive(Debug, Clone, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserDetailResponse {
    fn from(user: &User) -> Self {
        Self {
            user: UserResponse::from(user),
            roles: user.roles.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    #[serde(default)]
    pub title_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// PATCH body: only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchUserRequest {
    pub title_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `null` clears, absent keeps
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
}

/// PUT body: replaces every field
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub title_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Distinguishes an explicit `null` from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
