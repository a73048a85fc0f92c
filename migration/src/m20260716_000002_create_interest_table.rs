use sea_orm_migration::prelude::*;

/// Creates the `interest` table. The unique (`user_id`, `master_id`) index is
/// the real duplicate guard; handler pre-checks are advisory only.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Interest {
    Table,
    Id,
    UserId,
    MasterId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Master {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interest::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Interest::UserId).uuid().not_null())
                    .col(ColumnDef::new(Interest::MasterId).uuid().not_null())
                    .col(
                        ColumnDef::new(Interest::Status)
                            .string_len(20)
                            .not_null()
                            .default("interested"),
                    )
                    .col(
                        ColumnDef::new(Interest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interest::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interest_user_id")
                            .from(Interest::Table, Interest::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interest_master_id")
                            .from(Interest::Table, Interest::MasterId)
                            .to(Master::Table, Master::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_interest_user_master")
                    .table(Interest::Table)
                    .col(Interest::UserId)
                    .col(Interest::MasterId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interest::Table).to_owned())
            .await
    }
}
