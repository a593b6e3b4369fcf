//! `SeaORM` Entity for the parties table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PartySide;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub side: PartySide,
    pub current_balance: Decimal,
    pub version: i64,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_by: Uuid,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::party_ledger::Entity")]
    PartyLedger,
}

impl Related<super::party_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartyLedger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
