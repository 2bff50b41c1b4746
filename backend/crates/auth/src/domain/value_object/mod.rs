//! Value Object Module

pub mod email;
pub mod role_id;
pub mod user_id;
pub mod user_name;
pub mod user_status;
