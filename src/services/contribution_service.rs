use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use crate::entities::{contribution, ContributionType};
use crate::error::AppError;

pub struct ContributionService;

impl ContributionService {
    /// Append one ledger entry for a gamified user action. Generic over the
    /// connection so awards can ride inside a larger transaction.
    pub async fn award<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        kind: ContributionType,
        metadata: Option<serde_json::Value>,
    ) -> Result<contribution::Model, AppError> {
        let metadata_text = metadata
            .map(|m| serde_json::to_string(&m))
            .transpose()
            .map_err(|e| AppError::Internal(e.into()))?;

        let entry = contribution::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            contribution_type: Set(kind.as_str().to_string()),
            value: Set(kind.points()),
            metadata: Set(metadata_text),
            created_at: Set(Utc::now().fixed_offset()),
        };

        entry
            .insert(conn)
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Total points a user has accumulated across the whole ledger.
    pub async fn total_points<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<i64, AppError> {
        let entries = contribution::Entity::find()
            .filter(contribution::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(entries.iter().map(|c| i64::from(c.value)).sum())
    }

    /// The user's ledger, newest first, capped at `limit` rows.
    pub async fn ledger<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<contribution::Model>, AppError> {
        contribution::Entity::find()
            .filter(contribution::Column::UserId.eq(user_id))
            .order_by_desc(contribution::Column::CreatedAt)
            .paginate(conn, limit)
            .fetch_page(0)
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }
}
