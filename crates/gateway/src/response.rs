//! Success envelope shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{code, is_error, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Success<T> {
    pub code: u16,
    pub is_error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Success<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            is_error: false,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Success<()> {
    /// Envelope without a `data` field.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            is_error: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Schema of a success envelope that carries no data.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    #[schema(example = 200)]
    pub code: u16,
    pub is_error: bool,
    #[schema(example = "user successfully updated")]
    pub message: String,
}
