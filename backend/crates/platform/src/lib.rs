//! Platform Crate - Technical Infrastructure
//!
//! Domain-free building blocks used by the auth crate:
//! - Password hashing (bcrypt by default, Argon2id accepted) with NIST input policy
//! - Cryptographic utilities (OS randomness, base64url)
//! - Compact JWE with `A256KW` key wrapping and `A256CBC-HS512` content encryption

pub mod crypto;
pub mod jwe;
pub mod password;
