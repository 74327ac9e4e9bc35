//! Error types for the gateway layer

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_users::UserError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("missing authorization header")]
    MissingAuthorizationHeader,

    #[error("broken bearer")]
    BrokenBearer { prefix: String },

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid id")]
    InvalidId(String),

    #[error("invalid body")]
    InvalidBody(String),

    #[error("invalid input")]
    InvalidInput(String),

    #[error("user not found")]
    UserNotFound(String),

    #[error("no users found")]
    NoUsersFound,

    #[error("user already exists")]
    UserAlreadyExists(String),

    #[error("wrong password")]
    WrongPassword,

    #[error("unupdatable user")]
    UnupdatableUser,

    #[error("missing target")]
    MissingTarget,

    #[error("forbidden")]
    Forbidden(String),

    #[error("invalid endpoint")]
    InvalidEndpoint(String),

    #[error("unexpected error")]
    Unexpected(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingAuthorizationHeader
            | GatewayError::BrokenBearer { .. }
            | GatewayError::InvalidToken
            | GatewayError::TokenExpired
            | GatewayError::WrongPassword => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidId(_)
            | GatewayError::InvalidBody(_)
            | GatewayError::InvalidInput(_)
            | GatewayError::UserAlreadyExists(_)
            | GatewayError::UnupdatableUser
            | GatewayError::MissingTarget => StatusCode::BAD_REQUEST,
            GatewayError::UserNotFound(_)
            | GatewayError::NoUsersFound
            | GatewayError::InvalidEndpoint(_) => StatusCode::NOT_FOUND,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind, part of the wire format.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::MissingAuthorizationHeader => "missing_authorization_header",
            GatewayError::BrokenBearer { .. } => "broken_bearer",
            GatewayError::InvalidToken => "invalid_token",
            GatewayError::TokenExpired => "token_expired",
            GatewayError::InvalidId(_) => "invalid_id",
            GatewayError::InvalidBody(_) => "invalid_body",
            GatewayError::InvalidInput(_) => "invalid_input",
            GatewayError::UserNotFound(_) => "user_not_found",
            GatewayError::NoUsersFound => "no_users_found",
            GatewayError::UserAlreadyExists(_) => "user_already_exists",
            GatewayError::WrongPassword => "wrong_password",
            GatewayError::UnupdatableUser => "unupdatable_user",
            GatewayError::MissingTarget => "missing_target",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::InvalidEndpoint(_) => "invalid_endpoint",
            GatewayError::Unexpected(_) => "unexpected_error",
        }
    }

    pub fn details(&self) -> String {
        match self {
            GatewayError::MissingAuthorizationHeader => {
                "missing authorization header, check if the authorization header is set".to_string()
            }
            GatewayError::BrokenBearer { prefix } => format!(
                "authorization header malformed, it starts with {prefix:?} but needs to be \"Bearer <token>\""
            ),
            GatewayError::InvalidToken => "invalid token".to_string(),
            GatewayError::TokenExpired => "your token has expired, please login again".to_string(),
            GatewayError::NoUsersFound => "no users were found".to_string(),
            GatewayError::WrongPassword => {
                "the password is not valid, check if spelled right".to_string()
            }
            GatewayError::UnupdatableUser => {
                "the user you are trying to update is not updatable".to_string()
            }
            GatewayError::MissingTarget => "missing id of the user to update".to_string(),
            GatewayError::InvalidId(details)
            | GatewayError::InvalidBody(details)
            | GatewayError::InvalidInput(details)
            | GatewayError::UserNotFound(details)
            | GatewayError::UserAlreadyExists(details)
            | GatewayError::Forbidden(details)
            | GatewayError::InvalidEndpoint(details)
            | GatewayError::Unexpected(details) => details.clone(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code().as_u16(),
            is_error: true,
            message: self.to_string(),
            details: Some(self.details()),
            instance: None,
            error_type: Some(self.error_type().to_string()),
        }
    }
}

/// Error envelope returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = 404)]
    pub code: u16,
    pub is_error: bool,
    #[schema(example = "user not found")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Path of the request that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "/api/v1/user/42")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "user_not_found")]
    pub error_type: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_body();

        // The body travels as an extension too so `error_instance_middleware`
        // can stamp the request path on it.
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<UserError> for GatewayError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::NotFound => GatewayError::UserNotFound("user not found".to_string()),
            UserError::AlreadyExists { .. } => {
                GatewayError::UserAlreadyExists("a user with this email already exists".to_string())
            }
            UserError::Unupdatable => GatewayError::UnupdatableUser,
            UserError::WrongPassword => GatewayError::WrongPassword,
            UserError::MissingTarget => GatewayError::MissingTarget,
            UserError::Forbidden => {
                GatewayError::Forbidden("you are not allowed to perform this operation".to_string())
            }
            UserError::InvalidInput(details) => GatewayError::InvalidInput(details),
            UserError::Unexpected => {
                GatewayError::Unexpected("unexpected error, try again later".to_string())
            }
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidBody(format!("invalid body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        GatewayError::InvalidId(format!("id is not a valid number: {}", rejection.body_text()))
    }
}
