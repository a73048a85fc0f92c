use sea_orm_migration::prelude::*;

/// Creates the `contribution` table, an append-only gamification ledger.
/// Rows are never updated or deleted.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Contribution {
    Table,
    Id,
    UserId,
    ContributionType,
    Value,
    Metadata,
    CreatedAt,
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
                    .table(Contribution::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contribution::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contribution::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Contribution::ContributionType)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contribution::Value).integer().not_null())
                    .col(ColumnDef::new(Contribution::Metadata).text().null())
                    .col(
                        ColumnDef::new(Contribution::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contribution_user_id")
                            .from(Contribution::Table, Contribution::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contribution_user_id")
                    .table(Contribution::Table)
                    .col(Contribution::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contribution::Table).to_owned())
            .await
    }
}
