use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tracked URL owned by a user. `click_count` is denormalized for cheap
/// reads and is only mutated inside the click-tracking transaction, so it
/// always matches the `referral_click` row count.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_link")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_url: String,
    pub is_active: bool,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub click_count: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::referral_click::Entity")]
    ReferralClick,
    #[sea_orm(has_many = "super::conversion::Entity")]
    Conversion,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::referral_click::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralClick.def()
    }
}

impl Related<super::conversion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
