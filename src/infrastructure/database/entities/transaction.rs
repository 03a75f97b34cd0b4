//! Transaction entity (sea-orm)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    pub charger_id: String,
    pub id_tag: String,
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    pub start_time: DateTimeUtc,
    #[sea_orm(nullable)]
    pub end_time: Option<DateTimeUtc>,

    pub meter_start: i64,
    #[sea_orm(nullable)]
    pub meter_stop: Option<i64>,

    #[sea_orm(nullable, column_type = "Double")]
    pub energy_kwh: Option<f64>,
    #[sea_orm(nullable, column_type = "Double")]
    pub duration_minutes: Option<f64>,

    pub charging_rate_kw: f64,
    pub price_snapshot: i64,

    #[sea_orm(nullable, column_type = "Double")]
    pub total_cost: Option<f64>,

    /// ongoing | completed | cancelled
    pub status: String,
    pub meter_superseded: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::charger::Entity",
        from = "Column::ChargerId",
        to = "super::charger::Column::Id"
    )]
    Charger,
    #[sea_orm(has_one = "super::order::Entity")]
    Order,
    #[sea_orm(has_many = "super::meter_value::Entity")]
    MeterValues,
}

impl Related<super::charger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Charger.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::meter_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
