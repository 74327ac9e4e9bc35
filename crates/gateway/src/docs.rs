//! OpenAPI document for the HTTP surface.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorBody;
use crate::metrics;
use crate::response::MessageBody;
use crate::rest::{health, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        metrics::metrics_handler,
        users::list_users,
        users::get_user,
        users::register,
        users::login,
        users::me,
        users::update_user,
        users::regenerate_own_avatar,
        users::regenerate_avatar,
        users::delete_user,
        users::change_role,
    ),
    components(
        schemas(
            ErrorBody,
            MessageBody,
            health::HealthResponse,
            users::PublicUser,
            users::UserResponse,
            users::RegisterRequest,
            users::CreatedUser,
            users::LoginRequest,
            users::LoginResponse,
            users::UpdateUserRequest,
            users::AvatarResponse,
            users::ChangeRoleRequest,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "users", description = "Registration, login and user management"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        components
            .security_schemes
            .insert("bearerAuth".to_string(), scheme);
    }
}
