//! Order entity (sea-orm): business view of a Transaction, O1 one-to-one.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub transaction_id: i32,
    pub charger_id: String,
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    #[sea_orm(nullable, column_type = "Double")]
    pub energy_kwh: Option<f64>,
    #[sea_orm(nullable, column_type = "Double")]
    pub duration_minutes: Option<f64>,
    #[sea_orm(nullable, column_type = "Double")]
    pub total_cost: Option<f64>,

    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction::Entity",
        from = "Column::TransactionId",
        to = "super::transaction::Column::Id"
    )]
    Transaction,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
