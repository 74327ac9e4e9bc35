//! Helpers shared by the services and the transport.

pub mod jwt;
pub mod password;
pub mod validation;

pub use jwt::{Claims, JwtManager, DEFAULT_TOKEN_TTL};
pub use password::{hash_password, verify_password};
pub use validation::{validate_email, validate_name, validate_password};
