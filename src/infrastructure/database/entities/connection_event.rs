//! Append-only connection event entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "connection_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub charger_id: String,

    /// CONNECT, DISCONNECT, TIMEOUT, RECONNECT
    pub event_type: String,

    #[sea_orm(nullable)]
    pub connection_id: Option<String>,

    #[sea_orm(nullable)]
    pub remote_address: Option<String>,

    #[sea_orm(nullable)]
    pub subprotocol: Option<String>,

    #[sea_orm(nullable)]
    pub reason: Option<String>,

    /// seconds
    #[sea_orm(nullable)]
    pub session_duration: Option<i64>,

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
