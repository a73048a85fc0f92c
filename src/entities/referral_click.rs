use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One inbound visit through a referral link. Source of truth for click
/// counts. `converted_at` is reserved for attribution and is not written by
/// any current code path.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_click")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referral_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: String,
    pub browser: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub converted_at: Option<DateTimeWithTimeZone>,
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
