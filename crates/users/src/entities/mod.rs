//! Domain entities for the user management system.

pub mod user;

pub use user::{ParseRoleError, Role, User};
