use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::{extract_client_ip, extract_user_agent};
use crate::entities::referral_link;
use crate::error::AppError;
use crate::services::referral_service::{LinkStats, NewReferralLink, ReferralService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the referral-link route group: `/referrals/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_links).post(create_link))
        .route(
            "/{id}",
            get(get_link).patch(update_link).delete(delete_link),
        )
        .route("/{id}/stats", get(link_stats))
}

/// Click tracking lives at the server root (`/r/{code}`) so tracked URLs
/// stay short.
pub fn track_router() -> Router<AppState> {
    Router::new().route("/r/{code}", get(track))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLinkRequest {
    target_url: String,
    name: Option<String>,
    description: Option<String>,
    expires_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLinkRequest {
    name: Option<String>,
    description: Option<String>,
    target_url: Option<String>,
    is_active: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkResponse {
    id: Uuid,
    code: String,
    name: Option<String>,
    description: Option<String>,
    target_url: String,
    is_active: bool,
    expires_at: Option<String>,
    click_count: i64,
    created_at: String,
}

#[derive(Deserialize)]
struct StatsQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_clicks: u64,
    total_conversions: u64,
    conversion_rate: String,
    total_earnings: f64,
    countries: Vec<BreakdownResponse>,
    devices: Vec<BreakdownResponse>,
}

#[derive(Serialize)]
struct BreakdownResponse {
    label: String,
    count: u64,
}

#[derive(Deserialize)]
struct TrackQuery {
    to: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn link_response(link: &referral_link::Model) -> LinkResponse {
    LinkResponse {
        id: link.id,
        code: link.code.clone(),
        name: link.name.clone(),
        description: link.description.clone(),
        target_url: link.target_url.clone(),
        is_active: link.is_active,
        expires_at: link.expires_at.map(|t| t.to_rfc3339()),
        click_count: link.click_count,
        created_at: link.created_at.to_rfc3339(),
    }
}

fn stats_response(stats: LinkStats) -> StatsResponse {
    StatsResponse {
        total_clicks: stats.total_clicks,
        total_conversions: stats.total_conversions,
        conversion_rate: stats.conversion_rate,
        total_earnings: stats.total_earnings,
        countries: stats
            .countries
            .into_iter()
            .map(|e| BreakdownResponse {
                label: e.label,
                count: e.count,
            })
            .collect(),
        devices: stats
            .devices
            .into_iter()
            .map(|e| BreakdownResponse {
                label: e.label,
                count: e.count,
            })
            .collect(),
    }
}

fn validate_target_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("Target URL is required.".to_string());
    }
    if url.len() > 500 {
        return Err("Target URL must be at most 500 characters.".to_string());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/referrals`
async fn create_link(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Json(body): Json<CreateLinkRequest>,
) -> Result<Response, AppError> {
    validate_target_url(&body.target_url).map_err(AppError::BadRequest)?;

    let expires_at = body
        .expires_at
        .as_deref()
        .map(chrono::DateTime::parse_from_rfc3339)
        .transpose()
        .map_err(|_| {
            AppError::BadRequest("expiresAt must be an RFC 3339 timestamp.".to_string())
        })?;

    let link = ReferralService::create_link(
        &state.db,
        user_model.id,
        NewReferralLink {
            target_url: body.target_url.trim().to_string(),
            name: body.name,
            description: body.description,
            expires_at,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(link_response(&link))).into_response())
}

/// `GET /api/v1/referrals`
async fn list_links(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = referral_link::Entity::find()
        .filter(referral_link::Column::UserId.eq(user_model.id))
        .order_by_desc(referral_link::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(links.iter().map(link_response).collect()))
}

/// `GET /api/v1/referrals/{id}`
async fn get_link(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = ReferralService::find_owned(&state.db, id, user_model.id).await?;
    Ok(Json(link_response(&link)))
}

/// `PATCH /api/v1/referrals/{id}`
async fn update_link(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = ReferralService::find_owned(&state.db, id, user_model.id).await?;

    let mut active: referral_link::ActiveModel = link.into();

    if let Some(ref name) = body.name {
        active.name = Set(Some(name.clone()));
    }
    if let Some(ref description) = body.description {
        active.description = Set(Some(description.clone()));
    }
    if let Some(ref target_url) = body.target_url {
        validate_target_url(target_url).map_err(AppError::BadRequest)?;
        active.target_url = Set(target_url.trim().to_string());
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(link_response(&updated)))
}

/// `DELETE /api/v1/referrals/{id}`
async fn delete_link(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ReferralService::delete_link(&state.db, id, user_model.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/referrals/{id}/stats?days=30`
async fn link_stats(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let link = ReferralService::find_owned(&state.db, id, user_model.id).await?;
    let stats = ReferralService::stats(&state.db, &link, days).await?;
    Ok(Json(stats_response(stats)))
}

/// `GET /r/{code}?to=...`
///
/// Records the click and redirects: explicit `to` param, else the link's
/// stored target, else the site root. Inactive/expired links reject without
/// recording anything.
async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Response, AppError> {
    let ip_address = extract_client_ip(&headers);
    let user_agent = extract_user_agent(&headers);

    let outcome = ReferralService::track_click(&state.db, &code, ip_address, user_agent).await?;

    let destination = query
        .to
        .filter(|to| !to.trim().is_empty())
        .unwrap_or_else(|| {
            if outcome.link.target_url.trim().is_empty() {
                "/".to_string()
            } else {
                outcome.link.target_url.clone()
            }
        });

    Ok(Redirect::to(&destination).into_response())
}
