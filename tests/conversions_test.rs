mod common;

use std::time::Instant;

use axum::http::StatusCode;
use axum::Router;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde_json::json;

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

/// Create a referral link owned by a fresh user and return its id.
async fn seed_link(app: &Router, db: &DatabaseConnection) -> anyhow::Result<String> {
    let owner = common::seed_user(db, "owner@example.com", "user").await?;
    let (status, body) = common::post_json_with_auth(
        app,
        "/api/v1/referrals",
        &json!({ "targetUrl": "/masters" }),
        &common::token_for(&owner),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    Ok(json["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn record_conversion_requires_permission() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let link_id = seed_link(&app, &db).await?;
    let regular = common::seed_user(&db, "user@example.com", "user").await?;

    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/conversions",
        &json!({
            "referralId": link_id,
            "orderId": "order-1",
            "orderValue": 120.0,
            "productType": "experience",
        }),
        &common::token_for(&regular),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn record_conversion_computes_commission_and_starts_pending() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let link_id = seed_link(&app, &db).await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;

    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/conversions",
        &json!({
            "referralId": link_id,
            "orderId": "order-1",
            "orderValue": 120.0,
            "productType": "workshop",
        }),
        &common::token_for(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["status"], "pending");
    // Workshops pay 15%
    assert!((json["commission"].as_f64().unwrap_or(0.0) - 18.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn duplicate_order_id_conflicts() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let link_id = seed_link(&app, &db).await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;
    let token = common::token_for(&admin);

    let payload = json!({
        "referralId": link_id,
        "orderId": "order-1",
        "orderValue": 50.0,
        "productType": "experience",
    });

    let (status, _body) =
        common::post_json_with_auth(&app, "/api/v1/conversions", &payload, &token).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _body) =
        common::post_json_with_auth(&app, "/api/v1/conversions", &payload, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn status_transition_confirm_then_immutable() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let link_id = seed_link(&app, &db).await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;
    let token = common::token_for(&admin);

    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/conversions",
        &json!({
            "referralId": link_id,
            "orderId": "order-1",
            "orderValue": 50.0,
            "productType": "experience",
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let id = created["id"].as_str().unwrap_or_default();

    // pending → confirmed
    let (status, body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/conversions/{id}/status"),
        &json!({ "status": "confirmed" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["status"], "confirmed");

    // confirmed conversions are settled
    let (status, _body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/conversions/{id}/status"),
        &json!({ "status": "cancelled" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_referral_is_404() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;

    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/conversions",
        &json!({
            "referralId": uuid::Uuid::new_v4(),
            "orderId": "order-1",
            "orderValue": 50.0,
            "productType": "experience",
        }),
        &common::token_for(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_positive_order_value_rejected() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let link_id = seed_link(&app, &db).await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;

    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/conversions",
        &json!({
            "referralId": link_id,
            "orderId": "order-1",
            "orderValue": 0.0,
            "productType": "experience",
        }),
        &common::token_for(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
