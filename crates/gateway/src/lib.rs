//! # Roster Gateway Crate
//!
//! HTTP transport for the user service: maps REST requests onto
//! `roster_users::UserService` calls and renders results in the JSON
//! success/error envelopes.
//!
//! ## Architecture
//!
//! - **REST**: `/api/v1/user/*` endpoints with OpenAPI documentation
//! - **State**: the shared user service and token manager
//! - **Middleware**: bearer authentication, error instances, panic recovery,
//!   CORS, logging
//! - **Metrics**: Prometheus request counters served at `/metrics`
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn run(state: roster_gateway::GatewayState) {
//! let app = roster_gateway::create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

pub mod docs;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;

// Re-export main types for convenience
pub use error::{ErrorBody, GatewayError, GatewayResult};
pub use metrics::HttpMetrics;
pub use middleware::auth_middleware;
pub use response::Success;
pub use state::{GatewayState, RosterUserService};

use std::sync::Arc;

use axum::{http::Uri, middleware as axum_middleware, Router};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = rest::create_rest_routes(arc_state.clone())
        .fallback(invalid_endpoint)
        .with_state(arc_state.clone());

    // Add Swagger UI if in debug mode
    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        );
    }

    router
        .layer(middleware::create_catch_panic_middleware())
        .layer(axum_middleware::from_fn(middleware::error_instance_middleware))
        .layer(axum_middleware::from_fn_with_state(
            arc_state,
            metrics::metrics_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::create_trace_middleware())
        .layer(middleware::create_cors_middleware())
}

async fn invalid_endpoint(uri: Uri) -> GatewayError {
    GatewayError::InvalidEndpoint(format!("endpoint {} is not handled", uri.path()))
}
