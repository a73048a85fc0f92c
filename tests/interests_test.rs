mod common;

use std::time::Instant;

use axum::http::StatusCode;
use axum::Router;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;

use tatami_api::entities::{contribution, interest};
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

/// Create a master through the API with an admin token.
async fn seed_master(app: &Router, db: &DatabaseConnection) -> anyhow::Result<String> {
    let admin = common::seed_user(db, "master-admin@example.com", "admin").await?;
    let (status, body) = common::post_json_with_auth(
        app,
        "/api/v1/masters",
        &json!({ "nameEn": "Kenji", "nameJa": "けんじ" }),
        &common::token_for(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    Ok(json["id"].as_str().unwrap_or_default().to_string())
}

// ──────────────────────────────────────────────────────────────────────────────
// POST /api/v1/interests
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn express_interest_creates_row_and_awards_points() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let master_id = seed_master(&app, &db).await?;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;
    let token = common::token_for(&fan);

    let (status, body) = common::post_json_with_auth(
        &app,
        "/api/v1/interests",
        &json!({ "masterId": master_id }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["status"], "interested");

    let entries = contribution::Entity::find()
        .filter(contribution::Column::UserId.eq(fan.id))
        .filter(contribution::Column::ContributionType.eq("INTEREST"))
        .all(&db)
        .await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, 5);
    Ok(())
}

#[tokio::test]
async fn duplicate_interest_conflicts_with_single_row() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let master_id = seed_master(&app, &db).await?;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;
    let token = common::token_for(&fan);

    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/interests",
        &json!({ "masterId": master_id }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Second attempt conflicts, never overwrites
    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/interests",
        &json!({ "masterId": master_id }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let rows = interest::Entity::find()
        .filter(interest::Column::UserId.eq(fan.id))
        .all(&db)
        .await?;
    assert_eq!(rows.len(), 1, "exactly one interest row after a duplicate POST");
    Ok(())
}

#[tokio::test]
async fn interest_in_unknown_master_is_404() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;

    let (status, _body) = common::post_json_with_auth(
        &app,
        "/api/v1/interests",
        &json!({ "masterId": uuid::Uuid::new_v4() }),
        &common::token_for(&fan),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn express_interest_requires_auth() {
    let (app, _db) = test_app().await;
    let (status, _body) = common::post_json(
        &app,
        "/api/v1/interests",
        &json!({ "masterId": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ──────────────────────────────────────────────────────────────────────────────
// PATCH /api/v1/interests/{id}/status (forward-only funnel)
// ──────────────────────────────────────────────────────────────────────────────

async fn express(app: &Router, token: &str, master_id: &str) -> String {
    let (status, body) = common::post_json_with_auth(
        app,
        "/api/v1/interests",
        &json!({ "masterId": master_id }),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    json["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn status_moves_forward_through_the_funnel() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let master_id = seed_master(&app, &db).await?;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;
    let admin_token = common::token_for(&admin);

    let interest_id = express(&app, &common::token_for(&fan), &master_id).await;

    for next in ["contacted", "booked", "completed"] {
        let (status, body) = common::patch_json_with_auth(
            &app,
            &format!("/api/v1/interests/{interest_id}/status"),
            &json!({ "status": next }),
            &admin_token,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "transition to {next} failed: {body}");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        assert_eq!(json["status"], next);
    }
    Ok(())
}

#[tokio::test]
async fn backward_transition_rejected() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let master_id = seed_master(&app, &db).await?;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;
    let admin = common::seed_user(&db, "ops@example.com", "admin").await?;
    let admin_token = common::token_for(&admin);

    let interest_id = express(&app, &common::token_for(&fan), &master_id).await;

    let (status, _body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/interests/{interest_id}/status"),
        &json!({ "status": "booked" }),
        &admin_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // booked → contacted is a rewind
    let (status, _body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/interests/{interest_id}/status"),
        &json!({ "status": "contacted" }),
        &admin_token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same-state PATCH is also rejected
    let (status, _body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/interests/{interest_id}/status"),
        &json!({ "status": "booked" }),
        &admin_token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn status_update_requires_permission() -> anyhow::Result<()> {
    let (app, db) = test_app().await;
    let master_id = seed_master(&app, &db).await?;
    let fan = common::seed_user(&db, "fan@example.com", "user").await?;
    let fan_token = common::token_for(&fan);

    let interest_id = express(&app, &fan_token, &master_id).await;

    // The owning user still cannot drive the funnel without the permission
    let (status, _body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/interests/{interest_id}/status"),
        &json!({ "status": "contacted" }),
        &fan_token,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = interest::Entity::find()
        .filter(interest::Column::UserId.eq(fan.id))
        .one(&db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("interest missing"))?;
    assert_eq!(stored.status, "interested", "no mutation on 403");
    Ok(())
}
