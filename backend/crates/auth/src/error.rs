//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

use crate::application::token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user name or wrong password (deliberately indistinguishable)
    #[error("Incorrect username or password")]
    IncorrectCredentials,

    #[error("Account is not active")]
    AccountInactive,

    /// Token rejected at a token-handling entry point (refresh, bearer scheme)
    #[error("Invalid token or expired token.")]
    InvalidOrExpiredToken,

    /// Token rejected while resolving the caller
    #[error("Could not validate credentials")]
    CouldNotValidateCredentials,

    #[error("Not authenticated")]
    MissingBearer,

    /// Token is valid but its subject no longer exists
    #[error("User not found")]
    TokenSubjectNotFound,

    #[error("Incorrect current password")]
    IncorrectCurrentPassword,

    /// Caller lacks a required role or permission
    #[error("{0}")]
    PermissionDenied(String),

    #[error("User not found")]
    UserNotFound,

    #[error("User name already exists")]
    UserNameTaken,

    /// A session already exists for this user (create-only path)
    #[error("Session already exists for user")]
    DuplicateSession,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Startup-time misconfiguration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Couldn't encode token: {0}")]
    TokenEncoding(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::IncorrectCredentials
            | AuthError::AccountInactive
            | AuthError::InvalidOrExpiredToken
            | AuthError::CouldNotValidateCredentials
            | AuthError::MissingBearer
            | AuthError::TokenSubjectNotFound
            | AuthError::IncorrectCurrentPassword => ErrorKind::Unauthorized,
            AuthError::PermissionDenied(_) => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::UserNameTaken | AuthError::DuplicateSession => ErrorKind::Conflict,
            AuthError::InvalidInput(_) => ErrorKind::UnprocessableEntity,
            AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::Database(e) => AppError::from_database(e).kind(),
            AuthError::Configuration(_) | AuthError::TokenEncoding(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Server-side details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        if let AuthError::Database(e) = self {
            return AppError::from_database(e);
        }
        let kind = self.kind();
        if kind.is_server_error() {
            AppError::new(kind, "Internal server error")
        } else {
            AppError::new(kind, self.to_string())
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) | AuthError::TokenEncoding(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Configuration(msg) => {
                tracing::error!(message = %msg, "Auth configuration error");
            }
            AuthError::IncorrectCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountInactive => {
                tracing::warn!("Login attempt on inactive account");
            }
            AuthError::PermissionDenied(requirement) => {
                tracing::info!(requirement = %requirement, "Permission denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            AuthError::Database(e) => AppError::from_database(&e).with_source(e).into_response(),
            other => other.to_app_error().into_response(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSecret(msg) => AuthError::Configuration(msg),
            other => AuthError::TokenEncoding(other.to_string()),
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::PasswordValidation(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::IncorrectCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountInactive.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::PermissionDenied("Inactive user".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::DuplicateSession.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::InvalidInput("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AuthError::IncorrectCredentials.to_string(),
            "Incorrect username or password"
        );
        assert_eq!(
            AuthError::InvalidOrExpiredToken.to_string(),
            "Invalid token or expired token."
        );
        assert_eq!(
            AuthError::PermissionDenied("User is not role admin".into()).to_string(),
            "User is not role admin"
        );
    }

    #[test]
    fn test_server_errors_are_not_leaked() {
        let err = AuthError::Internal("connection string leaked".into());
        let app = err.to_app_error();
        assert_eq!(app.status_code(), 500);
        assert!(!app.message().contains("leaked"));
    }

    #[test]
    fn test_database_errors_keep_their_class() {
        let timeout = AuthError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(timeout.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.to_app_error().message(), "Database unavailable");

        let response = AuthError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let other = AuthError::Database(sqlx::Error::ColumnNotFound("password_hash".into()));
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!other.to_app_error().message().contains("password_hash"));
    }
}
