use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::entities::{interest, master, Permission};
use crate::auth::middleware::CurrentUser;
use crate::error::AppError;
use crate::services::audit::{compute_diff, AuditContext, AuditService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the master route group: `/masters/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_masters).post(create_master))
        .route(
            "/{id}",
            get(get_master).patch(update_master).delete(delete_master),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MasterResponse {
    id: Uuid,
    name_en: String,
    name_ja: String,
    title_en: Option<String>,
    title_ja: Option<String>,
    bio_en: Option<String>,
    bio_ja: Option<String>,
    is_active: bool,
    priority: i32,
    story_content: Option<Value>,
    top_clips: Option<Value>,
    mission_card: Option<Value>,
    created_at: String,
    updated_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMasterRequest {
    name_en: String,
    name_ja: String,
    title_en: Option<String>,
    title_ja: Option<String>,
    bio_en: Option<String>,
    bio_ja: Option<String>,
    priority: Option<i32>,
    story_content: Option<Value>,
    top_clips: Option<Value>,
    mission_card: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMasterRequest {
    name_en: Option<String>,
    name_ja: Option<String>,
    title_en: Option<String>,
    title_ja: Option<String>,
    bio_en: Option<String>,
    bio_ja: Option<String>,
    priority: Option<i32>,
    is_active: Option<bool>,
    story_content: Option<Value>,
    top_clips: Option<Value>,
    mission_card: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a stored JSON text column back into structured JSON for the API.
/// Corrupt text degrades to `null` rather than failing the read.
fn parse_doc(raw: Option<&String>) -> Option<Value> {
    raw.and_then(|s| serde_json::from_str(s).ok())
}

/// Stringify a JSON document for storage in a text column.
fn doc_to_text(doc: Option<&Value>) -> Result<Option<String>, AppError> {
    doc.map(|v| serde_json::to_string(v))
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))
}

fn master_response(m: &master::Model) -> MasterResponse {
    MasterResponse {
        id: m.id,
        name_en: m.name_en.clone(),
        name_ja: m.name_ja.clone(),
        title_en: m.title_en.clone(),
        title_ja: m.title_ja.clone(),
        bio_en: m.bio_en.clone(),
        bio_ja: m.bio_ja.clone(),
        is_active: m.is_active,
        priority: m.priority,
        story_content: parse_doc(m.story_content.as_ref()),
        top_clips: parse_doc(m.top_clips.as_ref()),
        mission_card: parse_doc(m.mission_card.as_ref()),
        created_at: m.created_at.to_rfc3339(),
        updated_at: m.updated_at.to_rfc3339(),
    }
}

/// Snapshot of the auditable fields, used to compute update diffs.
fn audit_snapshot(m: &master::Model) -> Value {
    json!({
        "nameEn": m.name_en,
        "nameJa": m.name_ja,
        "titleEn": m.title_en,
        "titleJa": m.title_ja,
        "bioEn": m.bio_en,
        "bioJa": m.bio_ja,
        "priority": m.priority,
        "isActive": m.is_active,
    })
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required.".to_string());
    }
    if name.len() > 200 {
        return Err("Name must be at most 200 characters.".to_string());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/masters`
///
/// Public listing: active masters only, highest priority first.
async fn list_masters(
    State(state): State<AppState>,
) -> Result<Json<Vec<MasterResponse>>, AppError> {
    let masters = master::Entity::find()
        .filter(master::Column::IsActive.eq(true))
        .order_by_desc(master::Column::Priority)
        .order_by_asc(master::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(masters.iter().map(master_response).collect()))
}

/// `GET /api/v1/masters/{id}`
async fn get_master(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MasterResponse>, AppError> {
    let found = master::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    Ok(Json(master_response(&found)))
}

/// `POST /api/v1/masters`
async fn create_master(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<CreateMasterRequest>,
) -> Result<Response, AppError> {
    current.require(Permission::ManageMasters)?;

    validate_name(&body.name_en).map_err(AppError::BadRequest)?;
    validate_name(&body.name_ja).map_err(AppError::BadRequest)?;

    let now = Utc::now().fixed_offset();
    let new_master = master::ActiveModel {
        id: Set(Uuid::new_v4()),
        name_en: Set(body.name_en.trim().to_string()),
        name_ja: Set(body.name_ja.trim().to_string()),
        title_en: Set(body.title_en),
        title_ja: Set(body.title_ja),
        bio_en: Set(body.bio_en),
        bio_ja: Set(body.bio_ja),
        is_active: Set(true),
        priority: Set(body.priority.unwrap_or(0)),
        story_content: Set(doc_to_text(body.story_content.as_ref())?),
        top_clips: Set(doc_to_text(body.top_clips.as_ref())?),
        mission_card: Set(doc_to_text(body.mission_card.as_ref())?),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = new_master
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "master.create",
        "master",
        Some(created.id.to_string()),
        Some(audit_snapshot(&created)),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok((StatusCode::CREATED, Json(master_response(&created))).into_response())
}

/// `PATCH /api/v1/masters/{id}`
async fn update_master(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMasterRequest>,
) -> Result<Json<MasterResponse>, AppError> {
    current.require(Permission::ManageMasters)?;

    let found = master::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    let before = audit_snapshot(&found);
    let mut active: master::ActiveModel = found.into();

    if let Some(ref name_en) = body.name_en {
        validate_name(name_en).map_err(AppError::BadRequest)?;
        active.name_en = Set(name_en.trim().to_string());
    }
    if let Some(ref name_ja) = body.name_ja {
        validate_name(name_ja).map_err(AppError::BadRequest)?;
        active.name_ja = Set(name_ja.trim().to_string());
    }
    if let Some(ref title_en) = body.title_en {
        active.title_en = Set(Some(title_en.clone()));
    }
    if let Some(ref title_ja) = body.title_ja {
        active.title_ja = Set(Some(title_ja.clone()));
    }
    if let Some(ref bio_en) = body.bio_en {
        active.bio_en = Set(Some(bio_en.clone()));
    }
    if let Some(ref bio_ja) = body.bio_ja {
        active.bio_ja = Set(Some(bio_ja.clone()));
    }
    if let Some(priority) = body.priority {
        active.priority = Set(priority);
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }
    if body.story_content.is_some() {
        active.story_content = Set(doc_to_text(body.story_content.as_ref())?);
    }
    if body.top_clips.is_some() {
        active.top_clips = Set(doc_to_text(body.top_clips.as_ref())?);
    }
    if body.mission_card.is_some() {
        active.mission_card = Set(doc_to_text(body.mission_card.as_ref())?);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "master.update",
        "master",
        Some(updated.id.to_string()),
        Some(compute_diff(&before, &audit_snapshot(&updated))),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(master_response(&updated)))
}

/// `DELETE /api/v1/masters/{id}`
///
/// Refused while any interest references the master; otherwise soft-deletes
/// by clearing `is_active` (the row persists).
async fn delete_master(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.require(Permission::ManageMasters)?;

    let found = master::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    let interest_count = interest::Entity::find()
        .filter(interest::Column::MasterId.eq(found.id))
        .count(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if interest_count > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete a master with {interest_count} expressed interests."
        )));
    }

    let master_id = found.id;
    let mut active: master::ActiveModel = found.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().fixed_offset());
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "master.delete",
        "master",
        Some(master_id.to_string()),
        None,
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
