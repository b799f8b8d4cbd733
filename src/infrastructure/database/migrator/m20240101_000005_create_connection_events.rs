//! Create connection_events table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectionEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectionEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConnectionEvents::ChargerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectionEvents::EventType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConnectionEvents::ConnectionId).string())
                    .col(ColumnDef::new(ConnectionEvents::RemoteAddress).string())
                    .col(ColumnDef::new(ConnectionEvents::Subprotocol).string())
                    .col(ColumnDef::new(ConnectionEvents::Reason).string())
                    .col(ColumnDef::new(ConnectionEvents::SessionDuration).big_integer())
                    .col(
                        ColumnDef::new(ConnectionEvents::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connection_events_charger_timestamp")
                    .table(ConnectionEvents::Table)
                    .col(ConnectionEvents::ChargerId)
                    .col(ConnectionEvents::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectionEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ConnectionEvents {
    Table,
    Id,
    ChargerId,
    EventType,
    ConnectionId,
    RemoteAddress,
    Subprotocol,
    Reason,
    SessionDuration,
    Timestamp,
}
