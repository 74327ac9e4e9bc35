//! Business logic services for the user management system.

pub mod avatar_service;
pub mod user_service;

pub use avatar_service::{AvatarGenerator, RandomAvatarGenerator};
pub use user_service::UserService;
