//! Create connectors table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_chargers::Chargers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connectors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Connectors::ChargerId).string().not_null())
                    .col(ColumnDef::new(Connectors::ConnectorId).integer().not_null())
                    .col(
                        ColumnDef::new(Connectors::Status)
                            .string()
                            .not_null()
                            .default("Available"),
                    )
                    .col(ColumnDef::new(Connectors::ErrorCode).string())
                    .col(
                        ColumnDef::new(Connectors::EnergyDelivered)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Connectors::PowerDelivered)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Connectors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Connectors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connectors_charger")
                            .from(Connectors::Table, Connectors::ChargerId)
                            .to(Chargers::Table, Chargers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connectors_charger_connector")
                    .table(Connectors::Table)
                    .col(Connectors::ChargerId)
                    .col(Connectors::ConnectorId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Connectors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Connectors {
    Table,
    Id,
    ChargerId,
    ConnectorId,
    Status,
    ErrorCode,
    EnergyDelivered,
    PowerDelivered,
    CreatedAt,
    UpdatedAt,
}
