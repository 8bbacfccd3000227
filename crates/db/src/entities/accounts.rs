//! `SeaORM` entity for the `accounts` table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccountType, NetWorthCategory};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub tenant_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub net_worth_category: NetWorthCategory,
    pub balance: Decimal,
    pub balance_date: Date,
    pub color: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::balance_anchors::Entity")]
    BalanceAnchors,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::balance_anchors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceAnchors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
