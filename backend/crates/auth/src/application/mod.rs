//! Application Layer
//!
//! Use cases and application services.

pub mod access_guard;
pub mod change_password;
pub mod config;
pub mod create_user;
pub mod manage_user;
pub mod permission;
pub mod refresh_token;
pub mod sign_in;
pub mod token;

// Re-exports
pub use access_guard::AccessGuard;
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use create_user::{CreateUserInput, CreateUserUseCase};
pub use manage_user::{ManageUserUseCase, UserChanges};
pub use permission::{PermissionGuard, RoleGuard};
pub use refresh_token::{RefreshTokenInput, RefreshTokenUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token::{TokenClaims, TokenCodec, TokenError};
