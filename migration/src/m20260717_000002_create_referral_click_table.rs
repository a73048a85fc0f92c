use sea_orm_migration::prelude::*;

/// Creates the `referral_click` table, the source of truth for click counts.
/// `converted_at` exists for attribution but no code path writes it.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ReferralClick {
    Table,
    Id,
    ReferralId,
    IpAddress,
    UserAgent,
    Device,
    Browser,
    Country,
    City,
    ConvertedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReferralLink {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReferralClick::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralClick::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReferralClick::ReferralId).uuid().not_null())
                    .col(
                        ColumnDef::new(ReferralClick::IpAddress)
                            .string_len(45)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::UserAgent)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::Device)
                            .string_len(50)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::Browser)
                            .string_len(50)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(ColumnDef::new(ReferralClick::Country).string_len(100).null())
                    .col(ColumnDef::new(ReferralClick::City).string_len(100).null())
                    .col(
                        ColumnDef::new(ReferralClick::ConvertedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralClick::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referral_click_referral_id")
                            .from(ReferralClick::Table, ReferralClick::ReferralId)
                            .to(ReferralLink::Table, ReferralLink::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Stats reads scan by link and trailing window
        manager
            .create_index(
                Index::create()
                    .name("idx_referral_click_referral_created")
                    .table(ReferralClick::Table)
                    .col(ReferralClick::ReferralId)
                    .col(ReferralClick::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReferralClick::Table).to_owned())
            .await
    }
}
