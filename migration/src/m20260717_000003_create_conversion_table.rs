use sea_orm_migration::prelude::*;

/// Creates the `conversion` table. `order_id` is unique so recording the same
/// order twice conflicts instead of double-counting commission.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Conversion {
    Table,
    Id,
    ReferralId,
    OrderId,
    OrderValue,
    Commission,
    Status,
    ProductType,
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
                    .table(Conversion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conversion::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Conversion::ReferralId).uuid().not_null())
                    .col(
                        ColumnDef::new(Conversion::OrderId)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Conversion::OrderValue).double().not_null())
                    .col(ColumnDef::new(Conversion::Commission).double().not_null())
                    .col(
                        ColumnDef::new(Conversion::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Conversion::ProductType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversion::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_conversion_referral_id")
                            .from(Conversion::Table, Conversion::ReferralId)
                            .to(ReferralLink::Table, ReferralLink::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Conversion::Table).to_owned())
            .await
    }
}
