//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extractors::OptionalUser;
pub use handlers::AuthAppState;
pub use middleware::{
    CurrentUser, PermissionLayer, authenticate, bearer_token, ensure_permissions, ensure_roles,
};
pub use router::{auth_router, users_router};
