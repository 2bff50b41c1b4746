//! User Status Value Object
//!
//! Two states only. Deactivation is a status flip; accounts are never
//! physically removed by the auth layer. The stored code keeps the historical
//! spelling `disactive`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal account - can log in and use every feature
    #[default]
    Active,

    /// Deactivated account - cannot log in
    Disactive,
}

impl UserStatus {
    /// String code used in storage and the API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disactive => "disactive",
        }
    }

    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "disactive" => Some(Self::Disactive),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
