//! User REST endpoints under `/api/v1/user`

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

use roster_users::utils::{hash_password, validate_email, validate_name, validate_password};
use roster_users::{Claims, ParseRoleError, Role, User, UserError, UserId};

use crate::error::{ErrorBody, GatewayError, GatewayResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth_middleware;
use crate::response::{MessageBody, Success};
use crate::state::GatewayState;

/// What anonymous callers get to see of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            avatar_url: user.avatar_url,
        }
    }
}

/// Full view of the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: String,
    #[schema(example = "user")]
    pub role: String,
    pub banned: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            avatar_url: user.avatar_url,
            role: user.role.to_string(),
            banned: user.banned,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    pub id: UserId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Partial update. Omitted fields keep their value; `id` defaults to the caller.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub id: Option<UserId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    #[schema(example = "admin")]
    pub role: String,
}

/// Create user routes; everything past the public reads requires a bearer token.
pub fn create_user_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let public = Router::new()
        .route("/all", get(list_users))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/:id", get(get_user));

    let protected = Router::new()
        .route("/me", get(me))
        .route("/update", post(update_user))
        .route("/avatar", post(regenerate_own_avatar))
        .route("/avatar/:id", post(regenerate_avatar))
        .route("/:id", delete(delete_user))
        .route("/:id/role", put(change_role))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

#[utoipa::path(
    get,
    path = "/api/v1/user/all",
    tag = "users",
    responses(
        (status = 200, description = "Every user, public view, wrapped in the success envelope", body = [PublicUser]),
        (status = 404, description = "No users registered", body = ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Success<Vec<PublicUser>>> {
    let users = state.user_service().get_all_users().await;
    if users.is_empty() {
        return Err(GatewayError::NoUsersFound);
    }

    let users = users.into_iter().map(PublicUser::from).collect();
    Ok(Success::ok("all users successfully retrieved", users))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found, public view", body = PublicUser),
        (status = 400, description = "Id is not a number", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user(
    State(state): State<Arc<GatewayState>>,
    ApiPath(id): ApiPath<UserId>,
) -> GatewayResult<Success<PublicUser>> {
    let user = state
        .user_service()
        .get_user(id)
        .await
        .map_err(|err| not_found_as(err, format!("user with id {id} not found")))?;

    Ok(Success::ok("user successfully retrieved", user.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created", body = CreatedUser),
        (status = 400, description = "Invalid body or email already taken", body = ErrorBody),
        (status = 500, description = "Unexpected error", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> GatewayResult<Success<CreatedUser>> {
    validate_name("first_name", &body.first_name)?;
    validate_name("last_name", &body.last_name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let id = state
        .user_service()
        .create_user(
            body.first_name.trim(),
            body.last_name.trim(),
            &body.email,
            &body.password,
            Role::User,
        )
        .await
        .map_err(|err| match err {
            UserError::AlreadyExists { .. } => GatewayError::UserAlreadyExists(format!(
                "user with email {} already exists",
                body.email
            )),
            other => other.into(),
        })?;

    Ok(Success::ok("user successfully created", CreatedUser { id }))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session token issued", body = LoginResponse),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown email", body = ErrorBody),
        (status = 500, description = "Unexpected error", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> GatewayResult<Success<LoginResponse>> {
    let service = state.user_service();

    let id = service
        .check_credentials(&body.email, &body.password)
        .await
        .map_err(|err| not_found_as(err, format!("there is no user with {} as email", body.email)))?;

    let user = service.get_user(id).await?;

    let jwt = state.jwt();
    let token = jwt.issue(user.id, &user.email, user.role).map_err(|err| {
        error!(error = %err, user_id = user.id, "failed to sign session token");
        GatewayError::Unexpected("unexpected error trying to generate your login token".to_string())
    })?;
    debug!(user_id = user.id, "issued session token");

    Ok(Success::ok(
        "user successfully logged in",
        LoginResponse {
            token,
            expires_in: jwt.ttl().as_secs(),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/me",
    tag = "users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Token references a deleted user", body = ErrorBody)
    )
)]
pub async fn me(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
) -> GatewayResult<Success<UserResponse>> {
    let user = load_caller(&state, &claims).await?;
    Ok(Success::ok("user successfully retrieved", user.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/update",
    tag = "users",
    security(("bearerAuth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Update applied (or silently ignored when not permitted)", body = MessageBody),
        (status = 400, description = "Invalid body or user not updatable", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not permitted", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> GatewayResult<Success<()>> {
    let service = state.user_service();
    let target_id = body.id.filter(|id| *id != 0).unwrap_or(claims.user_id);

    let mut target = match service.get_user(target_id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            load_caller(&state, &claims).await?;
            return Err(GatewayError::UserNotFound(format!(
                "there is no user with {target_id} as id"
            )));
        }
        Err(err) => return Err(err.into()),
    };

    apply_patch(&mut target, body)?;
    service.update_user(claims.user_id, target).await?;

    Ok(Success::message("user successfully updated"))
}

fn apply_patch(target: &mut User, patch: UpdateUserRequest) -> GatewayResult<()> {
    if let Some(first_name) = patch.first_name {
        validate_name("first_name", &first_name)?;
        target.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = patch.last_name {
        validate_name("last_name", &last_name)?;
        target.last_name = last_name.trim().to_string();
    }
    if let Some(email) = patch.email {
        validate_email(&email)?;
        target.email = email;
    }
    if let Some(password) = patch.password {
        validate_password(&password)?;
        target.password_hash = hash_password(&password)?;
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/user/avatar",
    tag = "users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "New avatar generated", body = AvatarResponse),
        (status = 400, description = "User not updatable", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn regenerate_own_avatar(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
) -> GatewayResult<Success<AvatarResponse>> {
    let caller = load_caller(&state, &claims).await?;
    refresh_avatar(&state, caller.id).await
}

#[utoipa::path(
    post,
    path = "/api/v1/user/avatar/{id}",
    tag = "users",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "New avatar generated", body = AvatarResponse),
        (status = 400, description = "User not updatable", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn regenerate_avatar(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<UserId>,
) -> GatewayResult<Success<AvatarResponse>> {
    let caller = load_caller(&state, &claims).await?;
    if !caller.is_admin() {
        return Err(GatewayError::Forbidden(
            "only admins can regenerate other users' avatars".to_string(),
        ));
    }

    refresh_avatar(&state, id).await
}

async fn refresh_avatar(
    state: &GatewayState,
    id: UserId,
) -> GatewayResult<Success<AvatarResponse>> {
    let service = state.user_service();
    let missing = || format!("there is no user with {id} as id");

    service
        .regenerate_avatar(id)
        .await
        .map_err(|err| not_found_as(err, missing()))?;
    let user = service
        .get_user(id)
        .await
        .map_err(|err| not_found_as(err, missing()))?;

    Ok(Success::ok(
        "user successfully updated with a new avatar",
        AvatarResponse {
            avatar_url: user.avatar_url,
        },
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}",
    tag = "users",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted (or silently ignored when not permitted)", body = MessageBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not permitted", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<UserId>,
) -> GatewayResult<Success<()>> {
    state
        .user_service()
        .delete_user(claims.user_id, id)
        .await
        .map_err(|err| not_found_as(err, format!("there is no user with {id} as id")))?;

    Ok(Success::message("user successfully deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/{id}/role",
    tag = "users",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MessageBody),
        (status = 400, description = "Unknown role or user not updatable", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn change_role(
    State(state): State<Arc<GatewayState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<ChangeRoleRequest>,
) -> GatewayResult<Success<()>> {
    let role: Role = body
        .role
        .parse()
        .map_err(|err: ParseRoleError| GatewayError::InvalidInput(err.to_string()))?;

    state
        .user_service()
        .change_role(claims.user_id, id, role)
        .await
        .map_err(|err| not_found_as(err, format!("there is no user with {id} as id")))?;

    Ok(Success::message("role successfully changed"))
}

/// Load the user behind the token, which may have been deleted since issue.
async fn load_caller(state: &GatewayState, claims: &Claims) -> GatewayResult<User> {
    state
        .user_service()
        .get_user(claims.user_id)
        .await
        .map_err(|err| {
            not_found_as(
                err,
                "the token references a user that does not exist, maybe the account was deleted"
                    .to_string(),
            )
        })
}

/// Convert, giving `NotFound` a more specific detail message.
fn not_found_as(err: UserError, details: String) -> GatewayError {
    match err {
        UserError::NotFound => GatewayError::UserNotFound(details),
        other => other.into(),
    }
}
