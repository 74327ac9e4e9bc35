//! Shared application state for the gateway

use std::sync::Arc;

use roster_users::{InMemoryUserRepository, JwtManager, RandomAvatarGenerator, UserService};

use crate::metrics::HttpMetrics;

/// The user service as wired for the server.
pub type RosterUserService = UserService<InMemoryUserRepository, RandomAvatarGenerator>;

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    user_service: Arc<RosterUserService>,
    jwt: Arc<JwtManager>,
    metrics: Arc<HttpMetrics>,
}

impl GatewayState {
    pub fn new(
        user_service: Arc<RosterUserService>,
        jwt: Arc<JwtManager>,
        metrics: Arc<HttpMetrics>,
    ) -> Self {
        Self {
            user_service,
            jwt,
            metrics,
        }
    }

    /// Get a user service reference
    pub fn user_service(&self) -> &RosterUserService {
        &self.user_service
    }

    /// Get the session token manager
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }
}
