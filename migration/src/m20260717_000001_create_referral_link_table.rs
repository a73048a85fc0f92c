use sea_orm_migration::prelude::*;

/// Creates the `referral_link` table. `click_count` is denormalized and is
/// only ever changed inside the same transaction as a click insert.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ReferralLink {
    Table,
    Id,
    UserId,
    Code,
    Name,
    Description,
    TargetUrl,
    IsActive,
    ExpiresAt,
    ClickCount,
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
                    .table(ReferralLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralLink::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReferralLink::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ReferralLink::Code)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ReferralLink::Name).string_len(100).null())
                    .col(
                        ColumnDef::new(ReferralLink::Description)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::TargetUrl)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralLink::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referral_link_user_id")
                            .from(ReferralLink::Table, ReferralLink::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReferralLink::Table).to_owned())
            .await
    }
}
