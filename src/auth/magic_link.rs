use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::magic_link_token;
use crate::error::AppError;

/// How long an issued sign-in link stays valid.
const TOKEN_TTL_MINUTES: i64 = 10;

/// Issue a single-use sign-in token for the given (already validated) email.
///
/// The token itself is returned for delivery; delivery is the caller's
/// concern (currently logged, email sending not wired up).
pub async fn issue(
    db: &DatabaseConnection,
    email: &str,
) -> Result<magic_link_token::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let expires_at = (Utc::now() + chrono::Duration::minutes(TOKEN_TTL_MINUTES)).fixed_offset();

    let record = magic_link_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        token: Set(Uuid::new_v4().to_string()),
        expires_at: Set(expires_at),
        used_at: Set(None),
        created_at: Set(now),
    };

    record
        .insert(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Consume a sign-in token: it must exist, be unused, and be unexpired.
/// Marks it used and returns the row (the caller signs the email in).
pub async fn consume(
    db: &DatabaseConnection,
    token: &str,
) -> Result<magic_link_token::Model, AppError> {
    let record = magic_link_token::Entity::find()
        .filter(magic_link_token::Column::Token.eq(token))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired sign-in link.".to_string()))?;

    if record.used_at.is_some() {
        return Err(AppError::BadRequest(
            "This sign-in link has already been used.".to_string(),
        ));
    }

    let now = Utc::now().fixed_offset();
    if record.expires_at < now {
        return Err(AppError::BadRequest(
            "Sign-in link has expired.".to_string(),
        ));
    }

    let mut active: magic_link_token::ActiveModel = record.into();
    active.used_at = Set(Some(now));
    active
        .update(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}
