//! REST API endpoints for the gateway

pub mod health;
pub mod users;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::metrics;
use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api/v1/user", users::create_user_routes(state))
}
