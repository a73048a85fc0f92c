use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::{AuthUser, CurrentUser};
use crate::entities::{interest, master, ContributionType, InterestStatus, Permission};
use crate::error::AppError;
use crate::services::audit::{AuditContext, AuditService};
use crate::services::contribution_service::ContributionService;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the interest route group: `/interests/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_interests).post(express_interest))
        .route("/me", get(my_interests))
        .route("/{id}/status", patch(update_status))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpressInterestRequest {
    master_id: Uuid,
}

#[derive(Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterestResponse {
    id: Uuid,
    user_id: Uuid,
    master_id: Uuid,
    status: String,
    created_at: String,
    updated_at: String,
}

fn interest_response(i: &interest::Model) -> InterestResponse {
    InterestResponse {
        id: i.id,
        user_id: i.user_id,
        master_id: i.master_id,
        status: i.status.clone(),
        created_at: i.created_at.to_rfc3339(),
        updated_at: i.updated_at.to_rfc3339(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/interests`
///
/// One row per (user, master): a duplicate attempt conflicts, it never
/// overwrites. The unique index is the guard; the insert maps its violation
/// to 409.
async fn express_interest(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Json(body): Json<ExpressInterestRequest>,
) -> Result<Response, AppError> {
    let target = master::Entity::find_by_id(body.master_id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let now = Utc::now().fixed_offset();
    let new_interest = interest::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_model.id),
        master_id: Set(target.id),
        status: Set(InterestStatus::Interested.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = match new_interest.insert(&txn).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                return Err(AppError::Conflict(
                    "Interest already expressed for this master.".to_string(),
                ));
            }
            _ => return Err(AppError::Internal(err.into())),
        },
    };

    ContributionService::award(
        &txn,
        user_model.id,
        ContributionType::Interest,
        Some(json!({ "masterId": target.id })),
    )
    .await?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((StatusCode::CREATED, Json(interest_response(&created))).into_response())
}

/// `GET /api/v1/interests/me`
async fn my_interests(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<Json<Vec<InterestResponse>>, AppError> {
    let interests = interest::Entity::find()
        .filter(interest::Column::UserId.eq(user_model.id))
        .order_by_desc(interest::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(interests.iter().map(interest_response).collect()))
}

/// `GET /api/v1/interests`
async fn list_interests(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<InterestResponse>>, AppError> {
    current.require(Permission::ManageInterests)?;

    let interests = interest::Entity::find()
        .order_by_desc(interest::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(interests.iter().map(interest_response).collect()))
}

/// `PATCH /api/v1/interests/{id}/status`
///
/// Forward-only funnel: interested → contacted → booked → completed.
async fn update_status(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<InterestResponse>, AppError> {
    current.require(Permission::ManageInterests)?;

    let next = InterestStatus::from_str(&body.status)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}.", body.status)))?;

    let found = interest::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Interest not found.".to_string()))?;

    let current_status = InterestStatus::from_str(&found.status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid stored status")))?;

    if !current_status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move interest from {current_status} to {next}."
        )));
    }

    let previous = found.status.clone();
    let mut active: interest::ActiveModel = found.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "interest.update_status",
        "interest",
        Some(updated.id.to_string()),
        Some(json!({ "from": previous, "to": updated.status })),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(interest_response(&updated)))
}
