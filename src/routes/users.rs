use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveModelTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::{user, ContributionType};
use crate::error::AppError;
use crate::routes::auth::{user_response, UserResponse};
use crate::services::contribution_service::ContributionService;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the user self-service route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/contributions", get(my_contributions))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(flatten)]
    user: UserResponse,
    total_points: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeRequest {
    display_name: Option<String>,
    avatar_url: Option<String>,
    locale: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContributionResponse {
    id: Uuid,
    contribution_type: String,
    value: i32,
    metadata: Option<serde_json::Value>,
    created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn validate_display_name(name: &str) -> Result<(), String> {
    if name.len() > 100 {
        return Err("Display name must be at most 100 characters.".to_string());
    }
    Ok(())
}

fn validate_locale(locale: &str) -> Result<(), String> {
    if locale.is_empty() || locale.len() > 10 {
        return Err("Locale must be between 1 and 10 characters.".to_string());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/users/me`
async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let total_points = ContributionService::total_points(&state.db, user_model.id).await?;

    Ok(Json(MeResponse {
        user: user_response(&user_model),
        total_points,
    }))
}

/// `PATCH /api/v1/users/me`
async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let mut active: user::ActiveModel = user_model.clone().into();

    if let Some(ref display_name) = body.display_name {
        validate_display_name(display_name).map_err(AppError::BadRequest)?;
        active.display_name = Set(Some(display_name.clone()));
    }

    if let Some(ref avatar_url) = body.avatar_url {
        active.avatar_url = Set(Some(avatar_url.clone()));
    }

    if let Some(ref locale) = body.locale {
        validate_locale(locale).map_err(AppError::BadRequest)?;
        active.locale = Set(locale.clone());
    }

    let changed = body.display_name.is_some() || body.avatar_url.is_some() || body.locale.is_some();

    let updated_user = if changed {
        active.updated_at = Set(Utc::now().fixed_offset());
        let updated = active
            .update(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        ContributionService::award(
            &state.db,
            updated.id,
            ContributionType::ProfileUpdate,
            None,
        )
        .await?;
        updated
    } else {
        user_model
    };

    let total_points = ContributionService::total_points(&state.db, updated_user.id).await?;

    Ok(Json(MeResponse {
        user: user_response(&updated_user),
        total_points,
    }))
}

/// `GET /api/v1/users/me/contributions`
async fn my_contributions(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<Json<Vec<ContributionResponse>>, AppError> {
    let entries = ContributionService::ledger(&state.db, user_model.id, 50).await?;

    let response = entries
        .into_iter()
        .map(|c| ContributionResponse {
            id: c.id,
            contribution_type: c.contribution_type,
            value: c.value,
            metadata: c.metadata.as_deref().and_then(|m| serde_json::from_str(m).ok()),
            created_at: c.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(response))
}
