use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use tower::ServiceExt;
use uuid::Uuid;

use tatami_api::config::{Config, Environment};
use tatami_api::entities::user;

/// Configuration used by every test app.
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
        jwt_session_expiration_secs: 604_800,
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_redirect_uri: String::new(),
        frontend_url: "http://localhost:3001".to_string(),
        video_dir: "test_videos".to_string(),
    }
}

/// Core request helper: send `method uri` with optional bearer token and JSON
/// body, returning (status, response headers, body text).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
    extra_headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, String) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }

    let request = if let Some(json) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap_or_default()
    } else {
        builder.body(Body::empty()).unwrap_or_default()
    };

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(bytes.to_vec()).unwrap_or_default();

    (status, headers, body_str)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "GET", uri, None, None, &[]).await;
    (status, body)
}

pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "GET", uri, Some(token), None, &[]).await;
    (status, body)
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    json: &serde_json::Value,
) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "POST", uri, None, Some(json), &[]).await;
    (status, body)
}

pub async fn post_json_with_auth(
    app: &Router,
    uri: &str,
    json: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "POST", uri, Some(token), Some(json), &[]).await;
    (status, body)
}

pub async fn patch_json_with_auth(
    app: &Router,
    uri: &str,
    json: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "PATCH", uri, Some(token), Some(json), &[]).await;
    (status, body)
}

pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let (status, _headers, body) = send(app, "DELETE", uri, Some(token), None, &[]).await;
    (status, body)
}

/// Insert a user row directly (bypassing the sign-in flow) and return it.
pub async fn seed_user(
    db: &DatabaseConnection,
    email: &str,
    role: &str,
) -> anyhow::Result<user::Model> {
    seed_user_with_permissions(db, email, role, None).await
}

/// Insert a user row with an explicit permission-override column.
pub async fn seed_user_with_permissions(
    db: &DatabaseConnection,
    email: &str,
    role: &str,
    permissions: Option<&str>,
) -> anyhow::Result<user::Model> {
    let now = Utc::now().fixed_offset();
    let id = Uuid::new_v4();
    let record = user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        display_name: Set(None),
        avatar_url: Set(None),
        role: Set(role.to_string()),
        permissions: Set(permissions.map(std::string::ToString::to_string)),
        is_active: Set(true),
        locale: Set("en".to_string()),
        referral_code: Set(format!("TEST{}", &id.simple().to_string()[..8].to_uppercase())),
        last_login_at: Set(None),
        last_login_ip: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(record.insert(db).await?)
}

/// Mint a session token for a seeded user.
pub fn token_for(user: &user::Model) -> String {
    tatami_api::auth::jwt::generate_session_token(user.id, &user.role, &test_config())
        .unwrap_or_default()
}
