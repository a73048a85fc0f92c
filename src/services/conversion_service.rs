use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, SqlErr};
use uuid::Uuid;

use crate::entities::{conversion, referral_link, ConversionStatus};
use crate::error::AppError;

/// Commission rate applied per product type when recording a conversion.
fn commission_rate(product_type: &str) -> f64 {
    match product_type {
        "workshop" => 0.15,
        _ => 0.10,
    }
}

/// Fields accepted when recording a conversion against a referral link.
pub struct NewConversion {
    pub referral_id: Uuid,
    pub order_id: String,
    pub order_value: f64,
    pub product_type: String,
}

pub struct ConversionService;

impl ConversionService {
    /// Record a completed transaction against a referral link, computing the
    /// commission from the order value and product type. Conversions start
    /// `pending`; only a later confirmation makes them count toward earnings.
    ///
    /// `order_id` is unique: recording the same order twice returns 409
    /// instead of double-counting (idempotency guard).
    pub async fn record(
        db: &DatabaseConnection,
        new_conversion: NewConversion,
    ) -> Result<conversion::Model, AppError> {
        if new_conversion.order_value <= 0.0 {
            return Err(AppError::BadRequest(
                "Order value must be positive.".to_string(),
            ));
        }

        let link = referral_link::Entity::find_by_id(new_conversion.referral_id)
            .one(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::NotFound("Referral link not found.".to_string()))?;

        let commission = new_conversion.order_value * commission_rate(&new_conversion.product_type);

        let row = conversion::ActiveModel {
            id: Set(Uuid::new_v4()),
            referral_id: Set(link.id),
            order_id: Set(new_conversion.order_id),
            order_value: Set(new_conversion.order_value),
            commission: Set(commission),
            status: Set(ConversionStatus::Pending.as_str().to_string()),
            product_type: Set(new_conversion.product_type),
            created_at: Set(Utc::now().fixed_offset()),
        };

        match row.insert(db).await {
            Ok(model) => Ok(model),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::Conflict(
                    "This order has already been recorded.".to_string(),
                )),
                _ => Err(AppError::Internal(err.into())),
            },
        }
    }

    /// Move a conversion out of `pending`. Settled conversions (confirmed or
    /// cancelled) are immutable.
    pub async fn update_status(
        db: &DatabaseConnection,
        conversion_id: Uuid,
        next: ConversionStatus,
    ) -> Result<conversion::Model, AppError> {
        let row = conversion::Entity::find_by_id(conversion_id)
            .one(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::NotFound("Conversion not found.".to_string()))?;

        let current = ConversionStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid stored status")))?;

        if current != ConversionStatus::Pending || next == ConversionStatus::Pending {
            return Err(AppError::BadRequest(format!(
                "Cannot change a {current} conversion to {next}."
            )));
        }

        let mut active: conversion::ActiveModel = row.into();
        active.status = Set(next.as_str().to_string());
        active
            .update(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_rates() {
        assert!((commission_rate("workshop") - 0.15).abs() < f64::EPSILON);
        assert!((commission_rate("experience") - 0.10).abs() < f64::EPSILON);
        assert!((commission_rate("anything-else") - 0.10).abs() < f64::EPSILON);
    }
}
