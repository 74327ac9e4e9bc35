//! Password hashing and verification utilities.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use crate::types::{UserError, UserResult};

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!(error = %err, "password hashing failed");
            UserError::Unexpected
        })
}

/// Verify a password against a stored PHC string.
///
/// A stored hash that does not parse is reported as `Unexpected`, a plain
/// mismatch as `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|err| {
        error!(error = %err, "stored password hash is malformed");
        UserError::Unexpected
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
