use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    conversion, referral_click, referral_link, ContributionType, ConversionStatus,
};
use crate::error::AppError;
use crate::services::contribution_service::ContributionService;
use crate::utils::{
    generate_link_code, normalize_code, parse_user_agent, LINK_CODE_LENGTH, LINK_CODE_LENGTH_WIDE,
};

/// Maximum insert attempts per code length before widening / giving up.
const MAX_CODE_GENERATION_ATTEMPTS: u32 = 10;

/// Fields accepted when registering a new referral link.
pub struct NewReferralLink {
    pub target_url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::FixedOffset>>,
}

/// A recorded click and the link it landed on.
pub struct TrackOutcome {
    pub link: referral_link::Model,
    pub click: referral_click::Model,
}

/// Aggregated statistics for one link over a trailing window.
pub struct LinkStats {
    pub total_clicks: u64,
    pub total_conversions: u64,
    /// Percentage with two decimals; `"0.00"` when there are no clicks.
    pub conversion_rate: String,
    /// Sum of commission over confirmed conversions only.
    pub total_earnings: f64,
    pub countries: Vec<BreakdownEntry>,
    pub devices: Vec<BreakdownEntry>,
}

/// One bucket of a grouped breakdown, ordered by descending count.
pub struct BreakdownEntry {
    pub label: String,
    pub count: u64,
}

pub struct ReferralService;

impl ReferralService {
    /// Register a new referral link for `user_id`.
    ///
    /// The unique index on `code` is the real uniqueness guard: the insert
    /// itself is retried on collision, up to `MAX_CODE_GENERATION_ATTEMPTS`
    /// times at the normal length and the same again at the widened length
    /// before failing explicitly.
    pub async fn create_link(
        db: &DatabaseConnection,
        user_id: Uuid,
        new_link: NewReferralLink,
    ) -> Result<referral_link::Model, AppError> {
        for suffix_len in [LINK_CODE_LENGTH, LINK_CODE_LENGTH_WIDE] {
            for _ in 0..MAX_CODE_GENERATION_ATTEMPTS {
                let now = Utc::now().fixed_offset();
                let link = referral_link::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    code: Set(generate_link_code(suffix_len)),
                    name: Set(new_link.name.clone()),
                    description: Set(new_link.description.clone()),
                    target_url: Set(new_link.target_url.clone()),
                    is_active: Set(true),
                    expires_at: Set(new_link.expires_at),
                    click_count: Set(0),
                    created_at: Set(now),
                    updated_at: Set(now),
                };

                match link.insert(db).await {
                    Ok(model) => return Ok(model),
                    Err(err) => match err.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(_)) => {}
                        _ => return Err(AppError::Internal(err.into())),
                    },
                }
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "Failed to generate a unique referral code after widening the code space"
        )))
    }

    /// Look up a link and verify ownership: 404 when absent, 403 when owned
    /// by someone else.
    pub async fn find_owned(
        db: &DatabaseConnection,
        link_id: Uuid,
        user_id: Uuid,
    ) -> Result<referral_link::Model, AppError> {
        let link = referral_link::Entity::find_by_id(link_id)
            .one(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::NotFound("Referral link not found.".to_string()))?;

        if link.user_id != user_id {
            return Err(AppError::Forbidden(
                "You do not own this referral link.".to_string(),
            ));
        }

        Ok(link)
    }

    /// Delete an owned link. Refused while any conversion on the link is
    /// pending or confirmed, to avoid orphaning revenue-bearing records.
    pub async fn delete_link(
        db: &DatabaseConnection,
        link_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let link = Self::find_owned(db, link_id, user_id).await?;

        let blocking = conversion::Entity::find()
            .filter(conversion::Column::ReferralId.eq(link.id))
            .filter(
                conversion::Column::Status.is_in([
                    ConversionStatus::Pending.as_str(),
                    ConversionStatus::Confirmed.as_str(),
                ]),
            )
            .one(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        if blocking.is_some() {
            return Err(AppError::BadRequest(
                "Cannot delete a link with pending or confirmed conversions.".to_string(),
            ));
        }

        link.delete(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(())
    }

    /// Record an inbound visit through `code`.
    ///
    /// Inactive and expired links are terminal business rejections: no click
    /// row is written and the caller must not redirect onward. For a valid
    /// link, the click insert, the store-level counter increment, and the
    /// owner's REFERRAL_CLICK contribution are one transaction, so the
    /// denormalized count can never drift from the click rows.
    pub async fn track_click(
        db: &DatabaseConnection,
        code: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<TrackOutcome, AppError> {
        let normalized = normalize_code(code);

        let link = referral_link::Entity::find()
            .filter(referral_link::Column::Code.eq(&normalized))
            .one(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::NotFound("Referral link not found.".to_string()))?;

        if !link.is_active {
            return Err(AppError::BadRequest(
                "Referral link is inactive.".to_string(),
            ));
        }

        let now = Utc::now().fixed_offset();
        if let Some(expires_at) = link.expires_at
            && expires_at < now
        {
            return Err(AppError::BadRequest(
                "Referral link has expired.".to_string(),
            ));
        }

        let (device, browser) = parse_user_agent(user_agent.as_deref());

        let txn = db
            .begin()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let click = referral_click::ActiveModel {
            id: Set(Uuid::new_v4()),
            referral_id: Set(link.id),
            ip_address: Set(ip_address),
            user_agent: Set(user_agent),
            device: Set(device),
            browser: Set(browser),
            country: Set(None), // geo derivation is stubbed
            city: Set(None),
            converted_at: Set(None),
            created_at: Set(now),
        };
        let click = click
            .insert(&txn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        // Store-level increment, not read-modify-write, so concurrent clicks
        // cannot lose updates.
        referral_link::Entity::update_many()
            .col_expr(
                referral_link::Column::ClickCount,
                Expr::col(referral_link::Column::ClickCount).add(1),
            )
            .filter(referral_link::Column::Id.eq(link.id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        ContributionService::award(
            &txn,
            link.user_id,
            ContributionType::ReferralClick,
            Some(serde_json::json!({ "referralId": link.id, "code": link.code })),
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(TrackOutcome { link, click })
    }

    /// Compute on-demand statistics for a link over the trailing
    /// `window_days` days. Full scans per request; acceptable at this data
    /// scale, nothing is cached or materialized.
    pub async fn stats(
        db: &DatabaseConnection,
        link: &referral_link::Model,
        window_days: i64,
    ) -> Result<LinkStats, AppError> {
        let since = (Utc::now() - chrono::Duration::days(window_days)).fixed_offset();

        let clicks = referral_click::Entity::find()
            .filter(referral_click::Column::ReferralId.eq(link.id))
            .filter(referral_click::Column::CreatedAt.gte(since))
            .all(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let conversions = conversion::Entity::find()
            .filter(conversion::Column::ReferralId.eq(link.id))
            .filter(conversion::Column::CreatedAt.gte(since))
            .all(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let total_clicks = clicks.len() as u64;
        let total_conversions = conversions.len() as u64;

        let conversion_rate = if total_clicks == 0 {
            "0.00".to_string()
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = total_conversions as f64 / total_clicks as f64 * 100.0;
            format!("{rate:.2}")
        };

        let total_earnings = conversions
            .iter()
            .filter(|c| {
                ConversionStatus::from_str(&c.status)
                    .is_some_and(|s| s.counts_toward_earnings())
            })
            .map(|c| c.commission)
            .sum();

        let countries = breakdown(
            clicks
                .iter()
                .map(|c| c.country.clone().unwrap_or_else(|| "Unknown".to_string())),
        );
        let devices = breakdown(clicks.iter().map(|c| c.device.clone()));

        Ok(LinkStats {
            total_clicks,
            total_conversions,
            conversion_rate,
            total_earnings,
            countries,
            devices,
        })
    }
}

/// Group labels into counts, ordered by descending count (label as the
/// tie-break so output is deterministic).
fn breakdown<I: Iterator<Item = String>>(labels: I) -> Vec<BreakdownEntry> {
    let mut counts = std::collections::HashMap::<String, u64>::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut entries: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(label, count)| BreakdownEntry { label, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_orders_by_descending_count() {
        let entries = breakdown(
            ["JP", "US", "JP", "DE", "JP", "US"]
                .into_iter()
                .map(String::from),
        );
        let labels: Vec<(&str, u64)> = entries
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(labels, vec![("JP", 3), ("US", 2), ("DE", 1)]);
    }

    #[test]
    fn test_breakdown_empty() {
        assert!(breakdown(std::iter::empty()).is_empty());
    }
}
