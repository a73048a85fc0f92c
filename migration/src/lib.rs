pub use sea_orm_migration::prelude::*;

mod m20260715_000001_create_user_table;
mod m20260715_000002_create_auth_account_table;
mod m20260715_000003_create_magic_link_token_table;
mod m20260716_000001_create_master_table;
mod m20260716_000002_create_interest_table;
mod m20260717_000001_create_referral_link_table;
mod m20260717_000002_create_referral_click_table;
mod m20260717_000003_create_conversion_table;
mod m20260717_000004_create_contribution_table;
mod m20260718_000001_create_content_table;
mod m20260718_000002_create_admin_log_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260715_000001_create_user_table::Migration),
            Box::new(m20260715_000002_create_auth_account_table::Migration),
            Box::new(m20260715_000003_create_magic_link_token_table::Migration),
            Box::new(m20260716_000001_create_master_table::Migration),
            Box::new(m20260716_000002_create_interest_table::Migration),
            Box::new(m20260717_000001_create_referral_link_table::Migration),
            Box::new(m20260717_000002_create_referral_click_table::Migration),
            Box::new(m20260717_000003_create_conversion_table::Migration),
            Box::new(m20260717_000004_create_contribution_table::Migration),
            Box::new(m20260718_000001_create_content_table::Migration),
            Box::new(m20260718_000002_create_admin_log_table::Migration),
        ]
    }
}
