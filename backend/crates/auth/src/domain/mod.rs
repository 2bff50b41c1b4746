//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    organization_role::OrganizationRole,
    session::{Session, TokenPair},
    user::User,
};
pub use repository::{AuthStore, OrganizationRoleRepository, SessionRepository, UserRepository};
