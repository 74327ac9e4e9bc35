//! Shared types and error definitions used across the crate.

pub mod errors;

pub use errors::*;

/// Identifier assigned to a user by the repository. Always positive.
pub type UserId = i64;
