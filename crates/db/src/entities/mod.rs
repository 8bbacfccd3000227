//! `SeaORM` entity definitions for the five persisted tables (section 6):
//! `accounts`, `categories`, `transactions`, `balance_anchors`, and
//! `financial_cube`.

pub mod accounts;
pub mod balance_anchors;
pub mod categories;
pub mod financial_cube;
pub mod sea_orm_active_enums;
pub mod transactions;
