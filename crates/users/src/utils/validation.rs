//! Input validation for values arriving from the transport.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{UserError, UserResult};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 100;
const MAX_PASSWORD_LEN: usize = 128;

/// Validate email format
pub fn validate_email(email: &str) -> UserResult<()> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(UserError::InvalidInput("email too long".to_string()));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(UserError::InvalidInput("invalid email format".to_string()));
    }

    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &str, value: &str) -> UserResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(UserError::InvalidInput(format!("{field} must not be empty")));
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(UserError::InvalidInput(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }

    Ok(())
}

/// Passwords only need to be present; strength rules are left to clients.
pub fn validate_password(password: &str) -> UserResult<()> {
    if password.is_empty() {
        return Err(UserError::InvalidInput("password must not be empty".to_string()));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(UserError::InvalidInput(format!(
            "password must be at most {MAX_PASSWORD_LEN} bytes"
        )));
    }

    Ok(())
}
