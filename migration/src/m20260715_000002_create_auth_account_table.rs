use sea_orm_migration::prelude::*;

/// Creates the `auth_account` table linking external identities (Google) to users.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AuthAccount {
    Table,
    Id,
    UserId,
    Provider,
    ProviderAccountId,
    ProviderEmail,
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
                    .table(AuthAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthAccount::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthAccount::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AuthAccount::Provider)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthAccount::ProviderAccountId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthAccount::ProviderEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuthAccount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_account_user_id")
                            .from(AuthAccount::Table, AuthAccount::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per external identity
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_account_provider_account")
                    .table(AuthAccount::Table)
                    .col(AuthAccount::Provider)
                    .col(AuthAccount::ProviderAccountId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthAccount::Table).to_owned())
            .await
    }
}
