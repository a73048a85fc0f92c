use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::CurrentUser;
use crate::entities::{conversion, ConversionStatus, Permission};
use crate::error::AppError;
use crate::services::audit::{AuditContext, AuditService};
use crate::services::conversion_service::{ConversionService, NewConversion};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the conversion route group: `/conversions/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_conversion))
        .route("/{id}/status", patch(update_status))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordConversionRequest {
    referral_id: Uuid,
    order_id: String,
    order_value: f64,
    product_type: String,
}

#[derive(Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversionResponse {
    id: Uuid,
    referral_id: Uuid,
    order_id: String,
    order_value: f64,
    commission: f64,
    status: String,
    product_type: String,
    created_at: String,
}

fn conversion_response(c: &conversion::Model) -> ConversionResponse {
    ConversionResponse {
        id: c.id,
        referral_id: c.referral_id,
        order_id: c.order_id.clone(),
        order_value: c.order_value,
        commission: c.commission,
        status: c.status.clone(),
        product_type: c.product_type.clone(),
        created_at: c.created_at.to_rfc3339(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/conversions`
async fn record_conversion(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<RecordConversionRequest>,
) -> Result<Response, AppError> {
    current.require(Permission::ManageConversions)?;

    let order_id = body.order_id.trim().to_string();
    if order_id.is_empty() {
        return Err(AppError::BadRequest("Order ID is required.".to_string()));
    }

    let recorded = ConversionService::record(
        &state.db,
        NewConversion {
            referral_id: body.referral_id,
            order_id,
            order_value: body.order_value,
            product_type: body.product_type,
        },
    )
    .await?;

    AuditService::record(
        &state.db,
        current.user.id,
        "conversion.record",
        "conversion",
        Some(recorded.id.to_string()),
        Some(json!({
            "referralId": recorded.referral_id,
            "orderId": recorded.order_id,
            "orderValue": recorded.order_value,
            "commission": recorded.commission,
            "productType": recorded.product_type,
        })),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok((StatusCode::CREATED, Json(conversion_response(&recorded))).into_response())
}

/// `PATCH /api/v1/conversions/{id}/status`
async fn update_status(
    State(state): State<AppState>,
    current: CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ConversionResponse>, AppError> {
    current.require(Permission::ManageConversions)?;

    let next = ConversionStatus::from_str(&body.status)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}.", body.status)))?;

    let updated = ConversionService::update_status(&state.db, id, next).await?;

    AuditService::record(
        &state.db,
        current.user.id,
        "conversion.update_status",
        "conversion",
        Some(updated.id.to_string()),
        Some(json!({ "to": updated.status })),
        &AuditContext::from_headers(&headers),
    )
    .await;

    Ok(Json(conversion_response(&updated)))
}
