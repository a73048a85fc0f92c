use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's expressed intent toward a master. One row per (user, master);
/// the unique index is the duplicate guard.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interest")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub master_id: Uuid,
    pub status: String,
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
    #[sea_orm(
        belongs_to = "super::master::Entity",
        from = "Column::MasterId",
        to = "super::master::Column::Id"
    )]
    Master,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Master.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
