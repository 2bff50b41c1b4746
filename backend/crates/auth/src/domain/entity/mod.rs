pub mod organization_role;
pub mod session;
pub mod user;
