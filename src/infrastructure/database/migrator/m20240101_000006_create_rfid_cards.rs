//! Create rfid_cards table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RfidCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RfidCards::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RfidCards::IdTag)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RfidCards::UserId).string())
                    .col(
                        ColumnDef::new(RfidCards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RfidCards::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RfidCards::ExpiryDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RfidCards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RfidCards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RfidCards::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RfidCards {
    Table,
    Id,
    IdTag,
    UserId,
    IsActive,
    IsBlocked,
    ExpiryDate,
    CreatedAt,
    UpdatedAt,
}
