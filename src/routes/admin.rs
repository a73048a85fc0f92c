use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::CurrentUser;
use crate::entities::{admin_log, user, Permission, Role};
use crate::error::AppError;
use crate::services::audit::{AuditContext, AuditService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the admin route group: `/admin/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(update_role))
        .route("/users/{id}/permissions", patch(update_permissions))
        .route("/users/{id}", delete(deactivate_user))
        .route("/logs", get(list_logs))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminUserResponse {
    id: Uuid,
    email: String,
    display_name: Option<String>,
    role: String,
    permissions: Option<Vec<String>>,
    is_active: bool,
    locale: String,
    referral_code: String,
    last_login_at: Option<String>,
    created_at: String,
}

#[derive(Deserialize)]
struct UpdateRoleRequest {
    role: String,
}

#[derive(Deserialize)]
struct UpdatePermissionsRequest {
    permissions: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditLogResponse {
    id: Uuid,
    user_id: Uuid,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    details: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn admin_user_response(u: &user::Model) -> AdminUserResponse {
    AdminUserResponse {
        id: u.id,
        email: u.email.clone(),
        display_name: u.display_name.clone(),
        role: u.role.clone(),
        permissions: u
            .permissions
            .as_deref()
            .and_then(|p| serde_json::from_str(p).ok()),
        is_active: u.is_active,
        locale: u.locale.clone(),
        referral_code: u.referral_code.clone(),
        last_login_at: u.last_login_at.map(|t| t.to_rfc3339()),
        created_at: u.created_at.to_rfc3339(),
    }
}

async fn find_user(state: &AppState, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/admin/users`
async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    current.require(Permission::ManageUsers)?;

    let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
    let page = query.page.unwrap_or(0);

    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .paginate(&state.db, per_page)
        .fetch_page(page)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(users.iter().map(admin_user_response).collect()))
}

/// `PATCH /api/v1/admin/users/{id}/role`
///
/// Escalation rules: nobody changes their own role, and any change that
/// touches `super_admin` (granting it or demoting a holder) requires the
/// actor to already be `super_admin`.
async fn update_role(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<AdminUserResponse>, AppError> {
    current.require(Permission::ManageUsers)?;

    let next_role = Role::from_str(&body.role)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role: {}.", body.role)))?;

    if id == current.user.id {
        return Err(AppError::Forbidden(
            "You cannot change your own role.".to_string(),
        ));
    }

    let target = find_user(&state, id).await?;
    let target_role = Role::from_str(&target.role).unwrap_or_default();

    if (next_role.is_super_admin() || target_role.is_super_admin())
        && !current.role.is_super_admin()
    {
        return Err(AppError::Forbidden(
            "Only a super admin may grant or revoke the super admin role.".to_string(),
        ));
    }

    let previous = target.role.clone();
    let mut active: user::ActiveModel = target.into();
    active.role = Set(next_role.as_str().to_string());
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "user.update_role",
        "user",
        Some(updated.id.to_string()),
        Some(json!({ "from": previous, "to": updated.role })),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(admin_user_response(&updated)))
}

/// `PATCH /api/v1/admin/users/{id}/permissions`
///
/// Replaces the per-user override set. The override is additive at session
/// resolution (union with the role's base set), so an empty list simply
/// clears the column.
async fn update_permissions(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePermissionsRequest>,
) -> Result<Json<AdminUserResponse>, AppError> {
    current.require(Permission::ManageUsers)?;

    for name in &body.permissions {
        if Permission::from_str(name).is_none() {
            return Err(AppError::BadRequest(format!("Unknown permission: {name}.")));
        }
    }

    let target = find_user(&state, id).await?;

    let stored = if body.permissions.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&body.permissions).map_err(|e| AppError::Internal(e.into()))?)
    };

    let mut active: user::ActiveModel = target.into();
    active.permissions = Set(stored);
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "user.update_permissions",
        "user",
        Some(updated.id.to_string()),
        Some(json!({ "permissions": body.permissions })),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(admin_user_response(&updated)))
}

/// `DELETE /api/v1/admin/users/{id}`
///
/// Soft delete: accounts with activity are never hard-deleted, only
/// deactivated.
async fn deactivate_user(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.require(Permission::ManageUsers)?;

    let target = find_user(&state, id).await?;
    let target_role = Role::from_str(&target.role).unwrap_or_default();

    if target_role.is_super_admin() && !current.role.is_super_admin() {
        return Err(AppError::Forbidden(
            "Only a super admin may deactivate a super admin.".to_string(),
        ));
    }

    let target_id = target.id;
    let mut active: user::ActiveModel = target.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().fixed_offset());
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    AuditService::record(
        &state.db,
        current.user.id,
        "user.deactivate",
        "user",
        Some(target_id.to_string()),
        None,
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/admin/logs`
async fn list_logs(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, AppError> {
    current.require(Permission::ViewAuditLogs)?;

    let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
    let page = query.page.unwrap_or(0);

    let logs = admin_log::Entity::find()
        .order_by_desc(admin_log::Column::CreatedAt)
        .paginate(&state.db, per_page)
        .fetch_page(page)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let response = logs
        .into_iter()
        .map(|l| AuditLogResponse {
            id: l.id,
            user_id: l.user_id,
            action: l.action,
            entity_type: l.entity_type,
            entity_id: l.entity_id,
            details: l.details.as_deref().and_then(|d| serde_json::from_str(d).ok()),
            ip_address: l.ip_address,
            user_agent: l.user_agent,
            created_at: l.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(response))
}
