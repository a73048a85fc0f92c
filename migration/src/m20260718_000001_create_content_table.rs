use sea_orm_migration::prelude::*;

/// Creates the `content` table for CMS articles. `published_at` is only ever
/// written in the same transaction as a status change.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Content {
    Table,
    Id,
    Slug,
    Title,
    Body,
    Locale,
    Status,
    PublishedAt,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Content::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Content::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Content::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Content::Title).string_len(300).not_null())
                    .col(ColumnDef::new(Content::Body).text().not_null())
                    .col(
                        ColumnDef::new(Content::Locale)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(Content::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Content::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Content::AuthorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Content::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Content::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_author_id")
                            .from(Content::Table, Content::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Content::Table).to_owned())
            .await
    }
}
