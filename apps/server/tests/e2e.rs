use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use roster_config::AppConfig;
use roster_gateway::create_router;
use roster_runtime::BackendServices;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "davidevanoncini2003@gmail.com";
const USER_EMAIL: &str = "johndoe@bingchilling.cn";
const IMMUTABLE_EMAIL: &str = "foo@bar.com";

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "e2e-secret".to_string();
        config.seed.examples = true;

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");

        Self {
            router: create_router(services.gateway_state()),
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let app = self.router.clone();
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = app
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, json }
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/user/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.json);
        response.json["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    async fn id_of(&self, email: &str) -> i64 {
        let response = self.request(Method::GET, "/api/v1/user/all", None, None).await;
        response.json["data"]
            .as_array()
            .expect("user list")
            .iter()
            .find(|user| user["email"] == email)
            .and_then(|user| user["id"].as_i64())
            .expect("seeded user present")
    }
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn seeded_accounts_are_listed_without_secrets() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/user/all", None, None).await;
    assert_eq!(response.status, StatusCode::OK);

    let users = response.json["data"].as_array().expect("user list");
    assert_eq!(users.len(), 3);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user.get("role").is_none());
    }
}

#[tokio::test]
async fn admin_session_reports_admin_role() {
    let app = TestApp::new().await;
    let token = app.login(ADMIN_EMAIL, "password").await;

    let response = app
        .request(Method::GET, "/api/v1/user/me", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["email"], ADMIN_EMAIL);
    assert_eq!(response.json["data"]["role"], "admin");
}

#[tokio::test]
async fn regular_user_cannot_delete_the_admin() {
    let app = TestApp::new().await;
    let token = app.login(USER_EMAIL, "123secure").await;
    let admin_id = app.id_of(ADMIN_EMAIL).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/user/{admin_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/user/{admin_id}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn immutable_account_rejects_updates_even_from_admin() {
    let app = TestApp::new().await;
    let token = app.login(ADMIN_EMAIL, "password").await;
    let immutable_id = app.id_of(IMMUTABLE_EMAIL).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/user/update",
            Some(json!({ "id": immutable_id, "first_name": "Baz" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["error_type"], "unupdatable_user");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/user/avatar/{immutable_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_can_delete_the_immutable_account() {
    let app = TestApp::new().await;
    let token = app.login(ADMIN_EMAIL, "password").await;
    let immutable_id = app.id_of(IMMUTABLE_EMAIL).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/user/{immutable_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/user/{immutable_id}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json["error_type"], "user_not_found");
}

#[tokio::test]
async fn registered_user_can_log_in_and_rename_themselves() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/user/register",
            Some(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com",
                "password": "cobol"
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["id"], 4);

    let token = app.login("grace@example.com", "cobol").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/user/update",
            Some(json!({ "last_name": "Murray Hopper" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/user/me", None, Some(&token))
        .await;
    assert_eq!(response.json["data"]["last_name"], "Murray Hopper");
    assert_eq!(response.json["data"]["role"], "user");
}

#[tokio::test]
async fn metrics_are_served_next_to_the_api() {
    let app = TestApp::new().await;
    app.request(Method::GET, "/api/v1/user/all", None, None).await;

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}
