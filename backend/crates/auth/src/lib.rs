//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, token codec, guards
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, routers, middleware
//!
//! ## Features
//! - Login by form or JSON with username + password
//! - Access/refresh token pairs; refresh rotates both
//! - One stored session per user; a new login supersedes every older token
//! - Permission checks through organization roles, role checks on flat roles
//! - User administration with soft deactivation
//!
//! ## Security Model
//! - Passwords hashed with bcrypt, upgraded on login when the cost changes
//! - Tokens are HS256 JWS nested in an A256KW / A256CBC-HS512 JWE
//! - A token is only honoured while its `exp` equals the stored session expiry
//! - Unknown user and wrong password are indistinguishable to the client

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::{AuthAppState, auth_router, users_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
