#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dreamlight_api::auth::password::hash_password;
use dreamlight_api::config::{JwtConfig, LogFormat, ServerConfig};
use dreamlight_api::router::build_app_router;
use dreamlight_api::state::AppState;
use dreamlight_db::models::user::{CreateUser, User};
use dreamlight_db::repositories::UserRepo;

/// Password given to every user created through [`create_user`].
pub const TEST_PASSWORD: &str = "secret123";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
        max_file_size: 10 * 1024 * 1024,
        log_format: LogFormat::Pretty,
        bootstrap_admin: None,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router over `pool`.
///
/// Uploads land in the system temp directory; tests that write files use
/// [`build_test_app_with_uploads`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_uploads(pool, &std::env::temp_dir().join("dreamlight-test-uploads"))
}

pub fn build_test_app_with_uploads(pool: PgPool, upload_dir: &Path) -> Router {
    build_app_router(AppState::new(pool, test_config(upload_dir.to_path_buf())))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, name: &str, role: &str) -> User {
    let input = CreateUser {
        name: name.to_string(),
        email: format!("{}@test.com", name.to_lowercase().replace(' ', ".")),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the access token.
pub async fn login(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body, None).await;
    assert_eq!(response.status(), 200, "login should succeed for {email}");
    let json = body_json(response).await;
    json["data"]["access_token"]
        .as_str()
        .expect("access_token should be a string")
        .to_string()
}

/// Create a user and return it together with a fresh access token.
pub async fn user_with_token(app: &Router, pool: &PgPool, name: &str, role: &str) -> (User, String) {
    let user = create_user(pool, name, role).await;
    let token = login(app.clone(), &user.email).await;
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, None, token).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), token).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), token).await
}

pub async fn patch_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(body), token).await
}

pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::DELETE, uri, None, token).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Create a project as `token` and return its id.
pub async fn create_project(app: Router, token: &str, body: serde_json::Value) -> i64 {
    let response = post_json(app, "/api/v1/projects", body, Some(token)).await;
    assert_eq!(response.status(), 201, "project creation should succeed");
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("project id")
}
