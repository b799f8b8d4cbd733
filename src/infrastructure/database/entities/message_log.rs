//! Append-only OCPP message log entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "message_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub charger_id: String,

    /// IN, OUT, FORWARD
    pub direction: String,

    pub action: String,

    #[sea_orm(nullable)]
    pub message_id: Option<String>,

    /// Success, Error, Pending, Timeout
    pub status: String,

    /// milliseconds
    #[sea_orm(nullable)]
    pub processing_time: Option<f64>,

    #[sea_orm(nullable, column_type = "Text")]
    pub request: Option<String>,

    #[sea_orm(nullable, column_type = "Text")]
    pub response: Option<String>,

    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::charger::Entity",
        from = "Column::ChargerId",
        to = "super::charger::Column::Id"
    )]
    Charger,
}

impl Related<super::charger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Charger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
