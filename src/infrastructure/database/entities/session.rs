//! Charging session entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// OCPP transaction id, monotone per charger
    #[sea_orm(nullable)]
    pub transaction_id: Option<i32>,

    pub charger_id: String,

    #[sea_orm(nullable)]
    pub connector_id: Option<i32>,

    #[sea_orm(nullable)]
    pub id_tag: Option<String>,

    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    pub start_time: DateTimeUtc,

    #[sea_orm(nullable)]
    pub stop_time: Option<DateTimeUtc>,

    /// seconds
    #[sea_orm(nullable)]
    pub duration: Option<i64>,

    /// kWh
    pub energy_delivered: f64,

    pub cost: f64,

    /// Active, Completed, Stopped, Faulted
    pub status: String,

    /// Wh
    #[sea_orm(nullable)]
    pub meter_start: Option<f64>,

    #[sea_orm(nullable)]
    pub meter_stop: Option<f64>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
