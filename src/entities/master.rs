use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profiled craftsperson featured on the platform. `story_content`,
/// `top_clips`, and `mission_card` hold JSON documents as text; they are
/// parsed and stringified at the API boundary only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "master")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name_en: String,
    pub name_ja: String,
    pub title_en: Option<String>,
    pub title_ja: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio_ja: Option<String>,
    pub is_active: bool,
    pub priority: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub story_content: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub top_clips: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mission_card: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interest::Entity")]
    Interest,
}

impl Related<super::interest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
