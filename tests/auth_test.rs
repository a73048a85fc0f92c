mod common;

use std::time::Instant;

use axum::http::StatusCode;
use axum::Router;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde_json::json;
use uuid::Uuid;

use tatami_api::entities::{contribution, magic_link_token, user};
use tatami_api::state::AppState;

async fn test_app() -> (Router, DatabaseConnection) {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let state = AppState {
        db: db.clone(),
        config: common::test_config(),
        started_at: Instant::now(),
    };

    (tatami_api::routes::router().with_state(state), db)
}

/// Fetch the most recently issued magic-link token for an email.
async fn latest_magic_token(db: &DatabaseConnection, email: &str) -> String {
    magic_link_token::Entity::find()
        .filter(magic_link_token::Column::Email.eq(email))
        .order_by_desc(magic_link_token::Column::CreatedAt)
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|t| t.token)
        .unwrap_or_default()
}

/// Run the full magic-link flow and return (session token, user JSON).
async fn sign_in(app: &Router, db: &DatabaseConnection, email: &str) -> (String, serde_json::Value) {
    let (status, body) =
        common::post_json(app, "/api/v1/auth/magic-link/request", &json!({ "email": email })).await;
    assert_eq!(status, StatusCode::OK, "request failed: {body}");

    let token = latest_magic_token(db, email).await;
    let (status, body) = common::post_json(
        app,
        "/api/v1/auth/magic-link/verify",
        &json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "verify failed: {body}");

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let session = json["token"].as_str().unwrap_or_default().to_string();
    (session, json["user"].clone())
}

// ──────────────────────────────────────────────────────────────────────────────
// Magic link
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn magic_link_request_returns_constant_message() {
    let (app, _db) = test_app().await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/magic-link/request",
        &json!({ "email": "anyone@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(
        json["message"],
        "If the address is valid, a sign-in link has been sent."
    );
}

#[tokio::test]
async fn magic_link_request_rejects_invalid_email() {
    let (app, _db) = test_app().await;

    let (status, _body) = common::post_json(
        &app,
        "/api/v1/auth/magic-link/request",
        &json!({ "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn magic_link_verify_creates_user_with_referral_code() {
    let (app, db) = test_app().await;
    let (session, user_json) = sign_in(&app, &db, "first@example.com").await;

    assert!(!session.is_empty());
    assert_eq!(user_json["email"], "first@example.com");
    assert_eq!(user_json["role"], "user");
    let code = user_json["referralCode"].as_str().unwrap_or_default();
    assert_eq!(code.len(), 8);

    // Signup awards a SIGNUP contribution
    let user_id: Uuid = user_json["id"]
        .as_str()
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let entries = contribution::Entity::find()
        .filter(contribution::Column::UserId.eq(user_id))
        .all(&db)
        .await
        .unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].contribution_type, "SIGNUP");
    assert_eq!(entries[0].value, 10);
}

#[tokio::test]
async fn magic_link_token_is_single_use() {
    let (app, db) = test_app().await;
    let (_session, _user) = sign_in(&app, &db, "once@example.com").await;

    // Replay the already-consumed token
    let token = latest_magic_token(&db, "once@example.com").await;
    let (status, _body) = common::post_json(
        &app,
        "/api/v1/auth/magic-link/verify",
        &json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn magic_link_expired_token_rejected() {
    let (app, db) = test_app().await;

    // Seed a token that expired a minute ago
    let expired = magic_link_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set("late@example.com".to_string()),
        token: Set("expired-token".to_string()),
        expires_at: Set((Utc::now() - chrono::Duration::minutes(1)).fixed_offset()),
        used_at: Set(None),
        created_at: Set((Utc::now() - chrono::Duration::minutes(11)).fixed_offset()),
    };
    let _ = expired.insert(&db).await;

    let (status, _body) = common::post_json(
        &app,
        "/api/v1/auth/magic-link/verify",
        &json!({ "token": "expired-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No user was created
    let found = user::Entity::find()
        .filter(user::Column::Email.eq("late@example.com"))
        .one(&db)
        .await
        .unwrap_or_default();
    assert!(found.is_none());
}

#[tokio::test]
async fn magic_link_second_sign_in_awards_login() {
    let (app, db) = test_app().await;
    let (_s1, user_json) = sign_in(&app, &db, "repeat@example.com").await;
    let (_s2, _user) = sign_in(&app, &db, "repeat@example.com").await;

    let user_id: Uuid = user_json["id"]
        .as_str()
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let entries = contribution::Entity::find()
        .filter(contribution::Column::UserId.eq(user_id))
        .all(&db)
        .await
        .unwrap_or_default();

    let kinds: Vec<&str> = entries.iter().map(|c| c.contribution_type.as_str()).collect();
    assert!(kinds.contains(&"SIGNUP"));
    assert!(kinds.contains(&"LOGIN"));
    // Exactly one user row exists
    let count = user::Entity::find()
        .filter(user::Column::Email.eq("repeat@example.com"))
        .all(&db)
        .await
        .unwrap_or_default()
        .len();
    assert_eq!(count, 1);
}

// ──────────────────────────────────────────────────────────────────────────────
// GET /api/v1/auth/session (always 200, null when anonymous)
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_returns_200_null_for_anonymous() {
    let (app, _db) = test_app().await;

    let (status, body) = common::get(&app, "/api/v1/auth/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[tokio::test]
async fn session_returns_200_null_for_garbage_token() {
    let (app, _db) = test_app().await;

    let (status, body) =
        common::get_with_auth(&app, "/api/v1/auth/session", "not-a-real-token").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[tokio::test]
async fn session_returns_user_and_permissions_when_authenticated() {
    let (app, db) = test_app().await;
    let (session, _user) = sign_in(&app, &db, "session@example.com").await;

    let (status, body) = common::get_with_auth(&app, "/api/v1/auth/session", &session).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["user"]["email"], "session@example.com");
    // Regular users carry no permissions
    assert_eq!(json["permissions"], json!([]));
}

#[tokio::test]
async fn session_includes_admin_permissions() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let admin = common::seed_user(&db, "admin@example.com", "admin").await?;
    let token = common::token_for(&admin);

    let (status, body) = common::get_with_auth(&app, "/api/v1/auth/session", &token).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let perms = json["permissions"].as_array().cloned().unwrap_or_default();
    assert!(perms.contains(&json!("manage_masters")));
    assert!(perms.contains(&json!("view_audit_logs")));
    Ok(())
}

#[tokio::test]
async fn deactivated_user_cannot_authenticate() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let someone = common::seed_user(&db, "gone@example.com", "user").await?;
    let token = common::token_for(&someone);

    // Deactivate directly
    let mut active: user::ActiveModel = someone.into();
    active.is_active = Set(false);
    active.update(&db).await?;

    let (status, _body) = common::get_with_auth(&app, "/api/v1/users/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Session introspection still answers 200 with null
    let (status, body) = common::get_with_auth(&app, "/api/v1/auth/session", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
    Ok(())
}
