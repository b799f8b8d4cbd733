//! Create message_logs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MessageLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MessageLogs::ChargerId).string().not_null())
                    .col(ColumnDef::new(MessageLogs::Direction).string().not_null())
                    .col(ColumnDef::new(MessageLogs::Action).string().not_null())
                    .col(ColumnDef::new(MessageLogs::MessageId).string())
                    .col(
                        ColumnDef::new(MessageLogs::Status)
                            .string()
                            .not_null()
                            .default("Success"),
                    )
                    .col(ColumnDef::new(MessageLogs::ProcessingTime).double())
                    .col(ColumnDef::new(MessageLogs::Request).text())
                    .col(ColumnDef::new(MessageLogs::Response).text())
                    .col(
                        ColumnDef::new(MessageLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_logs_charger_timestamp")
                    .table(MessageLogs::Table)
                    .col(MessageLogs::ChargerId)
                    .col(MessageLogs::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MessageLogs {
    Table,
    Id,
    ChargerId,
    Direction,
    Action,
    MessageId,
    Status,
    ProcessingTime,
    Request,
    Response,
    Timestamp,
}
