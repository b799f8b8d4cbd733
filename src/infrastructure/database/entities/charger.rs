//! Charger entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chargers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(nullable)]
    pub vendor: Option<String>,

    #[sea_orm(nullable)]
    pub model: Option<String>,

    #[sea_orm(nullable)]
    pub serial_number: Option<String>,

    #[sea_orm(nullable)]
    pub firmware_version: Option<String>,

    /// One of the OCPP 1.6 status strings, "Unknown" or "Offline"
    pub status: String,

    #[sea_orm(nullable)]
    pub last_heartbeat: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub last_message: Option<String>,

    pub is_connected: bool,

    #[sea_orm(nullable)]
    pub connection_time: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub disconnect_time: Option<DateTimeUtc>,

    /// JSON object mirroring CP-reported configuration keys
    #[sea_orm(nullable, column_type = "Text")]
    pub configuration: Option<String>,

    pub max_retries: i32,
    pub retry_interval: i32,
    pub retry_enabled: bool,

    #[sea_orm(nullable)]
    pub site_id: Option<String>,

    #[sea_orm(nullable)]
    pub organization_id: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connector::Entity")]
    Connectors,
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::message_log::Entity")]
    MessageLogs,
    #[sea_orm(has_many = "super::connection_event::Entity")]
    ConnectionEvents,
}

impl Related<super::connector::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connectors.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
