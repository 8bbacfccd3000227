//! `SeaORM` entity for the `financial_cube` table: the pre-aggregated
//! dimensional cube cells C3 owns exclusively.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{FlowType, PeriodType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_cube")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub tenant_id: String,
    pub period_type: PeriodType,
    pub period_start: Date,
    pub period_end: Date,
    pub transaction_type: FlowType,
    pub category_id: Option<Uuid>,
    pub account_id: Uuid,
    pub is_recurring: bool,
    pub category_name: Option<String>,
    pub account_name: String,
    pub total_amount: Decimal,
    pub transaction_count: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
