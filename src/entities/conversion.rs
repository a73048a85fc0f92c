use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A completed transaction attributed to a referral link. `order_id` is
/// unique: re-recording the same order conflicts instead of double-counting.
/// Only `confirmed` rows count toward earnings.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversion")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referral_id: Uuid,
    #[sea_orm(unique)]
    pub order_id: String,
    pub order_value: f64,
    pub commission: f64,
    pub status: String,
    pub product_type: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::referral_link::Entity",
        from = "Column::ReferralId",
        to = "super::referral_link::Column::Id"
    )]
    ReferralLink,
}

impl Related<super::referral_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
