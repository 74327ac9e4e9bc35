//! # Roster Users Crate
//!
//! User records, their storage contract, session tokens and the service that
//! decides who may change what.
//!
//! ## Architecture
//!
//! - **Entities**: `User` and the closed `Role` set
//! - **Repositories**: the `UserRepo` contract and an in-memory store
//! - **Services**: the authorization core (`UserService`) and avatar generation
//! - **Types**: ids, error enums and result aliases
//! - **Utils**: JWT issuance, password hashing, input validation
//!
//! ## Usage
//!
//! ```rust
//! use roster_users::{InMemoryUserRepository, RandomAvatarGenerator, Role, UserService};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let service = UserService::new(
//!     InMemoryUserRepository::new(),
//!     RandomAvatarGenerator::new("https://avatars.example.com", 8),
//! );
//! let id = service
//!     .create_user("Ada", "Lovelace", "ada@example.com", "engine", Role::User)
//!     .await
//!     .unwrap();
//! assert_eq!(service.check_credentials("ada@example.com", "engine").await, Ok(id));
//! # });
//! ```

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{ParseRoleError, Role, User};
pub use repositories::{InMemoryUserRepository, UserRepo};
pub use services::{AvatarGenerator, RandomAvatarGenerator, UserService};
pub use types::{
    AvatarError, AvatarResult, RepositoryError, RepositoryResult, TokenError, TokenResult,
    UserError, UserId, UserResult,
};
pub use utils::{Claims, JwtManager, DEFAULT_TOKEN_TTL};
