//! Middleware for authentication and other cross-cutting concerns

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any as CorsAny, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, Level};

use crate::error::{ErrorBody, GatewayError, GatewayResult};
use crate::state::GatewayState;

/// Anything shorter cannot hold `Bearer ` plus a token.
const MIN_BEARER_LENGTH: usize = 10;
const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware that validates JWT tokens.
///
/// On success the validated `Claims` are attached as a request extension.
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .unwrap_or_default();

    let token = bearer_token(auth_header)?;

    let claims = state.jwt().validate(token).map_err(|err| {
        error!(error = %err, "rejecting bearer token");
        GatewayError::InvalidToken
    })?;

    if claims.is_expired() {
        debug!(user_id = claims.user_id, "bearer token expired");
        return Err(GatewayError::TokenExpired);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn bearer_token(auth_header: &str) -> GatewayResult<&str> {
    if auth_header.len() < MIN_BEARER_LENGTH {
        return Err(GatewayError::MissingAuthorizationHeader);
    }

    auth_header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| GatewayError::BrokenBearer {
            prefix: auth_header.chars().take(BEARER_PREFIX.len() + 1).collect(),
        })
}

/// Fill the `instance` field of error envelopes with the request path.
pub async fn error_instance_middleware(request: Request, next: Next) -> Response {
    let instance = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let mut response = next.run(request).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    body.instance.get_or_insert(instance);

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    (parts, Json(body)).into_response()
}

/// Turn a handler panic into the `unexpected_error` envelope.
pub fn create_catch_panic_middleware() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(panic_response as PanicHandler)
}

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(panic = message, "handler panicked");

    GatewayError::Unexpected("unexpected error, try again later".to_string()).into_response()
}

/// Create tracing middleware
pub fn create_trace_middleware() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// CORS middleware for cross-origin requests
pub fn create_cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
}
