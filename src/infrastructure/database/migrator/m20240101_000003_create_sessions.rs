//! Create sessions table

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
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::TransactionId).integer())
                    .col(ColumnDef::new(Sessions::ChargerId).string().not_null())
                    .col(ColumnDef::new(Sessions::ConnectorId).integer())
                    .col(ColumnDef::new(Sessions::IdTag).string())
                    .col(ColumnDef::new(Sessions::UserId).string())
                    .col(
                        ColumnDef::new(Sessions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::StopTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Sessions::Duration).big_integer())
                    .col(
                        ColumnDef::new(Sessions::EnergyDelivered)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Sessions::Cost).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string()
                            .not_null()
                            .default("Active"),
                    )
                    .col(ColumnDef::new(Sessions::MeterStart).double())
                    .col(ColumnDef::new(Sessions::MeterStop).double())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_charger")
                            .from(Sessions::Table, Sessions::ChargerId)
                            .to(Chargers::Table, Chargers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_charger_transaction")
                    .table(Sessions::Table)
                    .col(Sessions::ChargerId)
                    .col(Sessions::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_status")
                    .table(Sessions::Table)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Sessions {
    Table,
    Id,
    TransactionId,
    ChargerId,
    ConnectorId,
    IdTag,
    UserId,
    StartTime,
    StopTime,
    Duration,
    EnergyDelivered,
    Cost,
    Status,
    MeterStart,
    MeterStop,
    CreatedAt,
    UpdatedAt,
}
