//! Error types for the user management system.

use thiserror::Error;

use super::UserId;

/// Errors surfaced by the user service to its callers.
///
/// Repository details (ids, emails, backend messages) are logged where the
/// failure is translated and never carried here. `AlreadyExists` is the one
/// exception.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("user already exists")]
    AlreadyExists { id: UserId },

    #[error("user can't be updated")]
    Unupdatable,

    #[error("wrong password")]
    WrongPassword,

    #[error("missing id from user to update")]
    MissingTarget,

    #[error("operation not permitted")]
    Forbidden,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unexpected error")]
    Unexpected,
}

/// Errors reported by a [`UserRepo`](crate::repositories::UserRepo) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("user with id {id} not found")]
    NotFound { id: UserId },

    #[error("user with email {email} not found")]
    EmailNotFound { email: String },

    #[error("user with id {id} can't be updated")]
    Unupdatable { id: UserId },

    #[error("email already used by user {id}")]
    DuplicateEmail { id: UserId },

    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Session token errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token creation failed: {0}")]
    TokenCreationFailed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvatarError {
    #[error("avatar generation failed: {0}")]
    Generation(String),
}

pub type UserResult<T> = Result<T, UserError>;
pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type TokenResult<T> = Result<T, TokenError>;
pub type AvatarResult<T> = Result<T, AvatarError>;
