use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    /// Per-user permission override set, stored as a JSON array of
    /// permission strings. Merged (union) with the role's base set at
    /// session resolution; never written back in denormalized form.
    pub permissions: Option<String>,
    pub is_active: bool,
    pub locale: String,
    #[sea_orm(unique)]
    pub referral_code: String,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub last_login_ip: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auth_account::Entity")]
    AuthAccount,
    #[sea_orm(has_many = "super::referral_link::Entity")]
    ReferralLink,
    #[sea_orm(has_many = "super::contribution::Entity")]
    Contribution,
    #[sea_orm(has_many = "super::interest::Entity")]
    Interest,
}

impl Related<super::auth_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthAccount.def()
    }
}

impl Related<super::referral_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralLink.def()
    }
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contribution.def()
    }
}

impl Related<super::interest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
