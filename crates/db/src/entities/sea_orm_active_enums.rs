//! `SeaORM` active enums backing the Postgres enum types created by the
//! initial migration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account classification (section 3's `Account.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "CHECKING")]
    Checking,
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    #[sea_orm(string_value = "CREDIT")]
    Credit,
    #[sea_orm(string_value = "CREDIT_CARD")]
    CreditCard,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    #[sea_orm(string_value = "LOAN")]
    Loan,
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "TRADITIONAL_RETIREMENT")]
    TraditionalRetirement,
    #[sea_orm(string_value = "ROTH_RETIREMENT")]
    RothRetirement,
}

/// Whether an account counts toward assets, liabilities, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "net_worth_category")]
pub enum NetWorthCategory {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    #[sea_orm(string_value = "EXCLUDED")]
    Excluded,
}

/// Flow classification shared by categories, transactions, and cube cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "flow_type")]
pub enum FlowType {
    #[sea_orm(string_value = "INCOME")]
    Income,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
}

/// Cube period granularity (section 3's `CubeCell.period_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_type")]
pub enum PeriodType {
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
}

impl From<AccountType> for ledgercube_core::ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Checking => Self::Checking,
            AccountType::Savings => Self::Savings,
            AccountType::Credit => Self::Credit,
            AccountType::CreditCard => Self::CreditCard,
            AccountType::Investment => Self::Investment,
            AccountType::Loan => Self::Loan,
            AccountType::Cash => Self::Cash,
            AccountType::TraditionalRetirement => Self::TraditionalRetirement,
            AccountType::RothRetirement => Self::RothRetirement,
        }
    }
}

impl From<ledgercube_core::ledger::AccountType> for AccountType {
    fn from(value: ledgercube_core::ledger::AccountType) -> Self {
        match value {
            ledgercube_core::ledger::AccountType::Checking => Self::Checking,
            ledgercube_core::ledger::AccountType::Savings => Self::Savings,
            ledgercube_core::ledger::AccountType::Credit => Self::Credit,
            ledgercube_core::ledger::AccountType::CreditCard => Self::CreditCard,
            ledgercube_core::ledger::AccountType::Investment => Self::Investment,
            ledgercube_core::ledger::AccountType::Loan => Self::Loan,
            ledgercube_core::ledger::AccountType::Cash => Self::Cash,
            ledgercube_core::ledger::AccountType::TraditionalRetirement => Self::TraditionalRetirement,
            ledgercube_core::ledger::AccountType::RothRetirement => Self::RothRetirement,
        }
    }
}

impl From<NetWorthCategory> for ledgercube_core::ledger::NetWorthCategory {
    fn from(value: NetWorthCategory) -> Self {
        match value {
            NetWorthCategory::Asset => Self::Asset,
            NetWorthCategory::Liability => Self::Liability,
            NetWorthCategory::Excluded => Self::Excluded,
        }
    }
}

impl From<ledgercube_core::ledger::NetWorthCategory> for NetWorthCategory {
    fn from(value: ledgercube_core::ledger::NetWorthCategory) -> Self {
        match value {
            ledgercube_core::ledger::NetWorthCategory::Asset => Self::Asset,
            ledgercube_core::ledger::NetWorthCategory::Liability => Self::Liability,
            ledgercube_core::ledger::NetWorthCategory::Excluded => Self::Excluded,
        }
    }
}

impl From<FlowType> for ledgercube_core::ledger::FlowType {
    fn from(value: FlowType) -> Self {
        match value {
            FlowType::Income => Self::Income,
            FlowType::Expense => Self::Expense,
            FlowType::Transfer => Self::Transfer,
        }
    }
}

impl From<ledgercube_core::ledger::FlowType> for FlowType {
    fn from(value: ledgercube_core::ledger::FlowType) -> Self {
        match value {
            ledgercube_core::ledger::FlowType::Income => Self::Income,
            ledgercube_core::ledger::FlowType::Expense => Self::Expense,
            ledgercube_core::ledger::FlowType::Transfer => Self::Transfer,
        }
    }
}

impl From<PeriodType> for ledgercube_core::cube::PeriodType {
    fn from(value: PeriodType) -> Self {
        match value {
            PeriodType::Weekly => Self::Weekly,
            PeriodType::Monthly => Self::Monthly,
        }
    }
}

impl From<ledgercube_core::cube::PeriodType> for PeriodType {
    fn from(value: ledgercube_core::cube::PeriodType) -> Self {
        match value {
            ledgercube_core::cube::PeriodType::Weekly => Self::Weekly,
            ledgercube_core::cube::PeriodType::Monthly => Self::Monthly,
        }
    }
}
