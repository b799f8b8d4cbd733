//! Database migrations

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_chargers;
mod m20240101_000002_create_connectors;
mod m20240101_000003_create_sessions;
mod m20240101_000004_create_message_logs;
mod m20240101_000005_create_connection_events;
mod m20240101_000006_create_rfid_cards;
mod m20240101_000007_create_users;
mod m20240101_000008_create_system_config;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_chargers::Migration),
            Box::new(m20240101_000002_create_connectors::Migration),
            Box::new(m20240101_000003_create_sessions::Migration),
            Box::new(m20240101_000004_create_message_logs::Migration),
            Box::new(m20240101_000005_create_connection_events::Migration),
            Box::new(m20240101_000006_create_rfid_cards::Migration),
            Box::new(m20240101_000007_create_users::Migration),
            Box::new(m20240101_000008_create_system_config::Migration),
        ]
    }
}
