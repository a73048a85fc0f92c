use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use crate::config::{Config, Environment};

/// Establish a pooled connection to the database.
///
/// Connect and acquire timeouts are set explicitly so a dead database fails
/// requests quickly instead of hanging them. Development runs with a small
/// pool; production gets room for concurrent click traffic.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let max_connections = if config.environment == Environment::Production {
        20
    } else {
        5
    };

    let mut opts = ConnectOptions::new(&config.database_url);
    opts.max_connections(max_connections)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    Ok(db)
}
