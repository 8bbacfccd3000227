//! Initial database migration.
//!
//! Creates the five tables the core owns (section 6: `accounts`,
//! `categories`, `transactions`, `balance_anchors`, `financial_cube`), their
//! backing enums, and the indexes section 4.4 calls out by name.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(BALANCE_ANCHORS_SQL).await?;
        db.execute_unprepared(FINANCIAL_CUBE_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'CHECKING', 'SAVINGS', 'CREDIT', 'CREDIT_CARD', 'INVESTMENT',
    'LOAN', 'CASH', 'TRADITIONAL_RETIREMENT', 'ROTH_RETIREMENT'
);

CREATE TYPE net_worth_category AS ENUM ('ASSET', 'LIABILITY', 'EXCLUDED');

CREATE TYPE flow_type AS ENUM ('INCOME', 'EXPENSE', 'TRANSFER');

CREATE TYPE period_type AS ENUM ('WEEKLY', 'MONTHLY');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    net_worth_category net_worth_category NOT NULL,
    balance NUMERIC(12, 2) NOT NULL,
    balance_date DATE NOT NULL,
    color VARCHAR(32) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true
);

CREATE UNIQUE INDEX idx_accounts_active_name
    ON accounts (tenant_id, name) WHERE is_active = true;
CREATE INDEX idx_accounts_tenant ON accounts (tenant_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    type flow_type NOT NULL,
    color VARCHAR(32) NOT NULL
);

CREATE UNIQUE INDEX idx_categories_tenant_name_type
    ON categories (tenant_id, name, type);
CREATE INDEX idx_categories_tenant ON categories (tenant_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR(255) NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    category_id UUID REFERENCES categories(id),
    amount NUMERIC(12, 2) NOT NULL,
    description VARCHAR(1024) NOT NULL DEFAULT '',
    date DATE NOT NULL,
    type flow_type NOT NULL,
    is_recurring BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_tenant_account_date
    ON transactions (tenant_id, account_id, date);
CREATE INDEX idx_transactions_tenant_category_date
    ON transactions (tenant_id, category_id, date);
CREATE INDEX idx_transactions_tenant_date
    ON transactions (tenant_id, date);
";

const BALANCE_ANCHORS_SQL: &str = r"
CREATE TABLE balance_anchors (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR(255) NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    anchor_date DATE NOT NULL,
    balance NUMERIC(12, 2) NOT NULL,
    description VARCHAR(1024)
);

CREATE UNIQUE INDEX idx_balance_anchors_account_date
    ON balance_anchors (account_id, anchor_date);
CREATE INDEX idx_balance_anchors_tenant ON balance_anchors (tenant_id);
";

const FINANCIAL_CUBE_SQL: &str = r"
CREATE TABLE financial_cube (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR(255) NOT NULL,
    period_type period_type NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    transaction_type flow_type NOT NULL,
    category_id UUID,
    account_id UUID NOT NULL,
    is_recurring BOOLEAN NOT NULL,
    category_name VARCHAR(255),
    account_name VARCHAR(255) NOT NULL,
    total_amount NUMERIC(12, 2) NOT NULL,
    transaction_count BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Leads with (tenant_id, period_start, period_type) as section 4.4 requires.
CREATE INDEX idx_cube_tenant_period_start_type
    ON financial_cube (tenant_id, period_start, period_type);
CREATE INDEX idx_cube_tenant_category_period
    ON financial_cube (tenant_id, category_id, period_start);
CREATE INDEX idx_cube_tenant_account_period
    ON financial_cube (tenant_id, account_id, period_start);
CREATE INDEX idx_cube_tenant_type_period
    ON financial_cube (tenant_id, transaction_type, period_start);
CREATE INDEX idx_cube_tenant_recurring_period
    ON financial_cube (tenant_id, is_recurring, period_start);
CREATE UNIQUE INDEX idx_cube_dimensional_key ON financial_cube (
    tenant_id, period_type, period_start, transaction_type,
    category_id, account_id, is_recurring
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS financial_cube;
DROP TABLE IF EXISTS balance_anchors;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS accounts;
DROP TYPE IF EXISTS period_type;
DROP TYPE IF EXISTS flow_type;
DROP TYPE IF EXISTS net_worth_category;
DROP TYPE IF EXISTS account_type;
";
