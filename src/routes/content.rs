use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::CurrentUser;
use crate::entities::{content, ContentStatus, Permission};
use crate::error::AppError;
use crate::services::audit::{compute_diff, AuditContext, AuditService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the CMS content route group: `/content/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published).post(create_content))
        .route("/{slug}", get(get_published))
        .route("/id/{id}", get(get_for_edit).patch(update_content))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentResponse {
    id: Uuid,
    slug: String,
    title: String,
    body: String,
    locale: String,
    status: String,
    published_at: Option<String>,
    author_id: Uuid,
    created_at: String,
    updated_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateContentRequest {
    slug: String,
    title: String,
    body: String,
    locale: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateContentRequest {
    slug: Option<String>,
    title: Option<String>,
    body: Option<String>,
    locale: Option<String>,
    status: Option<String>,
}

fn content_response(c: &content::Model) -> ContentResponse {
    ContentResponse {
        id: c.id,
        slug: c.slug.clone(),
        title: c.title.clone(),
        body: c.body.clone(),
        locale: c.locale.clone(),
        status: c.status.clone(),
        published_at: c.published_at.map(|t| t.to_rfc3339()),
        author_id: c.author_id,
        created_at: c.created_at.to_rfc3339(),
        updated_at: c.updated_at.to_rfc3339(),
    }
}

fn audit_snapshot(c: &content::Model) -> serde_json::Value {
    json!({
        "slug": c.slug,
        "title": c.title,
        "locale": c.locale,
        "status": c.status,
        "publishedAt": c.published_at.map(|t| t.to_rfc3339()),
    })
}

fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() || slug.len() > 200 {
        return Err("Slug must be between 1 and 200 characters.".to_string());
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Slug may only contain lowercase letters, digits, and hyphens.".to_string());
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required.".to_string());
    }
    if title.len() > 300 {
        return Err("Title must be at most 300 characters.".to_string());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/content`
///
/// Public listing: published articles only, newest publication first.
async fn list_published(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentResponse>>, AppError> {
    let articles = content::Entity::find()
        .filter(content::Column::Status.eq(ContentStatus::Published.as_str()))
        .order_by_desc(content::Column::PublishedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(articles.iter().map(content_response).collect()))
}

/// `GET /api/v1/content/{slug}`
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentResponse>, AppError> {
    let article = content::Entity::find()
        .filter(content::Column::Slug.eq(&slug))
        .filter(content::Column::Status.eq(ContentStatus::Published.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Article not found.".to_string()))?;

    Ok(Json(content_response(&article)))
}

/// `GET /api/v1/content/id/{id}`
///
/// CMS view of an article in any status.
async fn get_for_edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContentResponse>, AppError> {
    current.require(Permission::ManageContent)?;

    let article = content::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Article not found.".to_string()))?;

    Ok(Json(content_response(&article)))
}

/// `POST /api/v1/content`
///
/// Creates a draft. The unique index on `slug` is the real guard; a
/// violation maps to 409.
async fn create_content(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<CreateContentRequest>,
) -> Result<Response, AppError> {
    current.require(Permission::ManageContent)?;

    let slug = body.slug.trim().to_lowercase();
    validate_slug(&slug).map_err(AppError::BadRequest)?;
    validate_title(&body.title).map_err(AppError::BadRequest)?;

    let now = Utc::now().fixed_offset();
    let new_article = content::ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(slug),
        title: Set(body.title.trim().to_string()),
        body: Set(body.body),
        locale: Set(body.locale.unwrap_or_else(|| "en".to_string())),
        status: Set(ContentStatus::Draft.as_str().to_string()),
        published_at: Set(None),
        author_id: Set(current.user.id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = match new_article.insert(&state.db).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                return Err(AppError::Conflict(
                    "An article with this slug already exists.".to_string(),
                ));
            }
            _ => return Err(AppError::Internal(err.into())),
        },
    };

    AuditService::record(
        &state.db,
        current.user.id,
        "content.create",
        "content",
        Some(created.id.to_string()),
        Some(audit_snapshot(&created)),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok((StatusCode::CREATED, Json(content_response(&created))).into_response())
}

/// `PATCH /api/v1/content/id/{id}`
///
/// `published_at` moves with the status in the same update: set on the
/// transition into `published`, cleared on any transition away.
async fn update_content(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateContentRequest>,
) -> Result<Json<ContentResponse>, AppError> {
    current.require(Permission::ManageContent)?;

    let found = content::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Article not found.".to_string()))?;

    let before = audit_snapshot(&found);
    let current_status = ContentStatus::from_str(&found.status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid stored status")))?;
    let mut active: content::ActiveModel = found.into();

    if let Some(ref slug) = body.slug {
        let slug = slug.trim().to_lowercase();
        validate_slug(&slug).map_err(AppError::BadRequest)?;
        active.slug = Set(slug);
    }
    if let Some(ref title) = body.title {
        validate_title(title).map_err(AppError::BadRequest)?;
        active.title = Set(title.trim().to_string());
    }
    if let Some(ref article_body) = body.body {
        active.body = Set(article_body.clone());
    }
    if let Some(ref locale) = body.locale {
        active.locale = Set(locale.clone());
    }

    let now = Utc::now().fixed_offset();
    if let Some(ref status) = body.status {
        let next = ContentStatus::from_str(status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {status}.")))?;

        active.status = Set(next.as_str().to_string());
        if next == ContentStatus::Published {
            if current_status != ContentStatus::Published {
                active.published_at = Set(Some(now));
            }
        } else {
            active.published_at = Set(None);
        }
    }
    active.updated_at = Set(now);

    let updated = match active.update(&state.db).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                return Err(AppError::Conflict(
                    "An article with this slug already exists.".to_string(),
                ));
            }
            _ => return Err(AppError::Internal(err.into())),
        },
    };

    AuditService::record(
        &state.db,
        current.user.id,
        "content.update",
        "content",
        Some(updated.id.to_string()),
        Some(compute_diff(&before, &audit_snapshot(&updated))),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(content_response(&updated)))
}
