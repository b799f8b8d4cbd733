//! SQLite persistence via SeaORM

pub mod entities;
pub mod migrator;
pub mod repositories;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ocpp_cms.db?mode=rwc".to_string(),
        }
    }
}

/// Open the connection pool. A single logical write never spans two pooled
/// connections; SeaORM scopes each statement/transaction to one checkout.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(10)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(url = %config.url, "Database connected");
    Ok(db)
}
