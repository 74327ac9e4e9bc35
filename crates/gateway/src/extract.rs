//! Extractors whose rejections render as [`GatewayError`] envelopes.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::GatewayError;

/// `axum::Json` with an `invalid_body` rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(GatewayError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with an `invalid_id` rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(GatewayError))]
pub struct ApiPath<T>(pub T);
