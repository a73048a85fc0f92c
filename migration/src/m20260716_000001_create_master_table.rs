use sea_orm_migration::prelude::*;

/// Creates the `master` table for profiled craftspeople. Bilingual profile
/// fields; nested story/clip/mission documents are stored as JSON text and
/// parsed at the API boundary.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Master {
    Table,
    Id,
    NameEn,
    NameJa,
    TitleEn,
    TitleJa,
    BioEn,
    BioJa,
    IsActive,
    Priority,
    StoryContent,
    TopClips,
    MissionCard,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Master::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Master::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Master::NameEn).string_len(200).not_null())
                    .col(ColumnDef::new(Master::NameJa).string_len(200).not_null())
                    .col(ColumnDef::new(Master::TitleEn).string_len(200).null())
                    .col(ColumnDef::new(Master::TitleJa).string_len(200).null())
                    .col(ColumnDef::new(Master::BioEn).text().null())
                    .col(ColumnDef::new(Master::BioJa).text().null())
                    .col(
                        ColumnDef::new(Master::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Master::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Master::StoryContent).text().null())
                    .col(ColumnDef::new(Master::TopClips).text().null())
                    .col(ColumnDef::new(Master::MissionCard).text().null())
                    .col(
                        ColumnDef::new(Master::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Master::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Master::Table).to_owned())
            .await
    }
}
