use sea_orm_migration::prelude::*;

/// Creates the `admin_log` table, an append-only audit trail written on every
/// privileged mutation.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AdminLog {
    Table,
    Id,
    UserId,
    Action,
    EntityType,
    EntityId,
    Details,
    IpAddress,
    UserAgent,
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
                    .table(AdminLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminLog::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AdminLog::UserId).uuid().not_null())
                    .col(ColumnDef::new(AdminLog::Action).string_len(100).not_null())
                    .col(
                        ColumnDef::new(AdminLog::EntityType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdminLog::EntityId).string_len(64).null())
                    .col(ColumnDef::new(AdminLog::Details).text().null())
                    .col(ColumnDef::new(AdminLog::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(AdminLog::UserAgent).string_len(500).null())
                    .col(
                        ColumnDef::new(AdminLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_log_user_id")
                            .from(AdminLog::Table, AdminLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminLog::Table).to_owned())
            .await
    }
}
