//! Create chargers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chargers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chargers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chargers::Vendor).string())
                    .col(ColumnDef::new(Chargers::Model).string())
                    .col(ColumnDef::new(Chargers::SerialNumber).string())
                    .col(ColumnDef::new(Chargers::FirmwareVersion).string())
                    .col(
                        ColumnDef::new(Chargers::Status)
                            .string()
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(ColumnDef::new(Chargers::LastHeartbeat).timestamp_with_time_zone())
                    .col(ColumnDef::new(Chargers::LastMessage).string())
                    .col(
                        ColumnDef::new(Chargers::IsConnected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Chargers::ConnectionTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Chargers::DisconnectTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Chargers::Configuration).text())
                    .col(
                        ColumnDef::new(Chargers::MaxRetries)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Chargers::RetryInterval)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Chargers::RetryEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Chargers::SiteId).string())
                    .col(ColumnDef::new(Chargers::OrganizationId).string())
                    .col(
                        ColumnDef::new(Chargers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chargers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chargers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Chargers {
    Table,
    Id,
    Vendor,
    Model,
    SerialNumber,
    FirmwareVersion,
    Status,
    LastHeartbeat,
    LastMessage,
    IsConnected,
    ConnectionTime,
    DisconnectTime,
    Configuration,
    MaxRetries,
    RetryInterval,
    RetryEnabled,
    SiteId,
    OrganizationId,
    CreatedAt,
    UpdatedAt,
}
