//! Domain value types for accounts, categories, transactions, and balance
//! anchors.
//!
//! These are the pure in-memory shapes the ledger service validates and the
//! cube and balance engines consume; mapping them to persisted rows lives
//! entirely in `ledgercube-db`.

use chrono::NaiveDate;
use ledgercube_shared::{AccountId, BalanceAnchorId, CategoryId, TransactionId};
use rust_decimal::Decimal;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    CreditCard,
    Investment,
    Loan,
    Cash,
    TraditionalRetirement,
    RothRetirement,
}

impl AccountType {
    /// Returns the net worth category an account of this type defaults to
    /// when none is supplied explicitly: credit-shaped and loan accounts are
    /// liabilities, everything else is an asset.
    #[must_use]
    pub fn default_net_worth_category(self) -> NetWorthCategory {
        match self {
            Self::Credit | Self::CreditCard | Self::Loan => NetWorthCategory::Liability,
            _ => NetWorthCategory::Asset,
        }
    }
}

/// Whether an account counts toward assets, liabilities, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetWorthCategory {
    Asset,
    Liability,
    Excluded,
}

/// Flow classification shared by categories, transactions, and cube cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    Income,
    Expense,
    Transfer,
}

/// A financial account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub net_worth_category: NetWorthCategory,
    pub balance: Decimal,
    pub balance_date: NaiveDate,
    pub color: String,
    pub is_active: bool,
}

/// A spending/income category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub kind: FlowType,
    pub color: String,
}

/// A single ledger posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub tx_type: FlowType,
    pub is_recurring: bool,
}

/// A trusted point-in-time balance snapshot for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAnchor {
    pub id: BalanceAnchorId,
    pub account_id: AccountId,
    pub anchor_date: NaiveDate,
    pub balance: Decimal,
    pub description: Option<String>,
}

/// Input for creating a new balance anchor directly (outside the
/// `reconcile_account` workflow, which synthesizes its own anchor).
#[derive(Debug, Clone)]
pub struct NewBalanceAnchor {
    pub account_id: AccountId,
    pub anchor_date: NaiveDate,
    pub balance: Decimal,
    pub description: Option<String>,
}

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub net_worth_category: Option<NetWorthCategory>,
    pub balance: Decimal,
    pub balance_date: NaiveDate,
    pub color: String,
    pub is_active: bool,
}

/// Partial update for an existing account; unset fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub net_worth_category: Option<NetWorthCategory>,
    pub balance: Option<Decimal>,
    pub balance_date: Option<NaiveDate>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for creating a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: FlowType,
    pub color: String,
}

/// Partial update for an existing category.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<FlowType>,
    pub color: Option<String>,
}

/// Input for creating a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub tx_type: FlowType,
    pub is_recurring: bool,
}

/// Partial update for an existing transaction. `category_id: Some(None)`
/// clears the category; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub account_id: Option<AccountId>,
    pub category_id: Option<Option<CategoryId>>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub tx_type: Option<FlowType>,
    pub is_recurring: Option<bool>,
}

/// Filters accepted by `list_accounts` (section 4.1.1).
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

/// Filters accepted by `list_categories`.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub kind: Option<FlowType>,
    pub search: Option<String>,
}

/// Filters accepted by `list_transactions`.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub tx_type: Option<FlowType>,
    pub is_recurring: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A transaction joined with its denormalized account and category names.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWithNames {
    pub transaction: Transaction,
    pub account_name: String,
    pub category_name: Option<String>,
}

/// The cube-relevant projection of a transaction: exactly the fields a
/// change descriptor needs to identify affected cube cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeProjection {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub tx_type: FlowType,
    pub is_recurring: bool,
}

impl From<&Transaction> for ChangeProjection {
    fn from(tx: &Transaction) -> Self {
        Self {
            account_id: tx.account_id,
            category_id: tx.category_id,
            amount: tx.amount,
            date: tx.date,
            tx_type: tx.tx_type,
            is_recurring: tx.is_recurring,
        }
    }
}

/// A single ledger mutation, sufficient to identify every cube cell it may
/// affect (section 3's Change Descriptor).
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeDescriptor {
    Insert {
        tx_id: TransactionId,
        new: ChangeProjection,
    },
    Update {
        tx_id: TransactionId,
        old: ChangeProjection,
        new: ChangeProjection,
    },
    Delete {
        tx_id: TransactionId,
        old: ChangeProjection,
    },
}

/// The closed set of fields a bulk update may touch (section 9 REDESIGN
/// FLAGS: no untyped field maps; `date` is excluded here at the type level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangedField {
    CategoryId,
    AccountId,
    Type,
    Amount,
    IsRecurring,
}

/// The single field a bulk update changes, carrying the uniform old value
/// observed across the affected rows and the new value every row is set to.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkFieldChange {
    CategoryId {
        old: Option<CategoryId>,
        new: Option<CategoryId>,
    },
    AccountId {
        old: AccountId,
        new: AccountId,
    },
    Type {
        old: FlowType,
        new: FlowType,
    },
    Amount {
        old: Decimal,
        new: Decimal,
    },
    IsRecurring {
        old: bool,
        new: bool,
    },
}

impl BulkFieldChange {
    /// The field this change targets.
    #[must_use]
    pub fn field(&self) -> ChangedField {
        match self {
            Self::CategoryId { .. } => ChangedField::CategoryId,
            Self::AccountId { .. } => ChangedField::AccountId,
            Self::Type { .. } => ChangedField::Type,
            Self::Amount { .. } => ChangedField::Amount,
            Self::IsRecurring { .. } => ChangedField::IsRecurring,
        }
    }
}

/// One distinct combination of the four cube dimensions observed, before the
/// change, among the rows a bulk update affects.
///
/// The bulk-metadata fast path (section 4.3.3) needs these, not the raw
/// `tx_ids`: the dimensions *other* than the one being changed can still
/// vary across the affected rows (S1 bulk-recategorizes 100 postings spread
/// across 3 accounts and both recurring flags), and the cube engine must
/// recompute one cell per distinct combination per period, not one per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionCombo {
    pub tx_type: FlowType,
    pub category_id: Option<CategoryId>,
    pub account_id: AccountId,
    pub is_recurring: bool,
}

/// A bulk ledger mutation covering many transactions whose changed field is
/// uniform across the affected set.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkChangeDescriptor {
    pub tx_ids: Vec<TransactionId>,
    pub change: BulkFieldChange,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Distinct pre-change `(type, category, account, recurring)` tuples
    /// observed among the affected rows, computed by the caller with a
    /// `SELECT DISTINCT` over `tx_ids` before applying the update.
    pub distinct_dimension_combos: Vec<DimensionCombo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_net_worth_category() {
        assert_eq!(
            AccountType::Checking.default_net_worth_category(),
            NetWorthCategory::Asset
        );
        assert_eq!(
            AccountType::CreditCard.default_net_worth_category(),
            NetWorthCategory::Liability
        );
        assert_eq!(
            AccountType::Loan.default_net_worth_category(),
            NetWorthCategory::Liability
        );
        assert_eq!(
            AccountType::Investment.default_net_worth_category(),
            NetWorthCategory::Asset
        );
    }

    #[test]
    fn test_change_projection_from_transaction() {
        let tx = Transaction {
            id: TransactionId::new(),
            account_id: AccountId::new(),
            category_id: None,
            amount: Decimal::new(-1000, 2),
            description: "coffee".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            tx_type: FlowType::Expense,
            is_recurring: false,
        };
        let projection = ChangeProjection::from(&tx);
        assert_eq!(projection.account_id, tx.account_id);
        assert_eq!(projection.amount, tx.amount);
        assert_eq!(projection.date, tx.date);
    }

    #[test]
    fn test_bulk_field_change_field_mapping() {
        let change = BulkFieldChange::Amount {
            old: Decimal::new(5000, 2),
            new: Decimal::new(4500, 2),
        };
        assert_eq!(change.field(), ChangedField::Amount);
    }
}
