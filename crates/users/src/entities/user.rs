//! User entity definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::UserId;

/// A user record as held by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Repository-assigned id, `0` until the record is created
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar_url: String,
    pub role: Role,
    /// Stored but not enforced anywhere yet
    pub banned: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_immutable(&self) -> bool {
        self.role == Role::Immutable
    }
}

/// Closed set of account roles. The lowercase names are part of the wire
/// format (token claims and JSON bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    /// Read-only after creation, for everyone including admins
    Immutable,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Immutable => "immutable",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "immutable" => Ok(Role::Immutable),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
