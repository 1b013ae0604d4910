//! Account store
//!
//! Point lookups by id, account number, and IBAN, plus version-checked
//! updates. An update with a stale version affects zero rows and surfaces
//! as `VersionConflict`, which closes the lost-update window between two
//! operations racing on the same IBAN.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{DomainError, Money};
use crate::error::{AppError, AppResult};

use super::{Account, AccountKind};

/// Row type for the `accounts` table. Monetary columns and ids are TEXT.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRow {
    id: String,
    account_no: String,
    iban: String,
    kind: String,
    owner_id: String,
    branch_id: i64,
    currency: String,
    balance: String,
    allowed_balance: String,
    minimum_allowed_balance: String,
    debt: String,
    disabled: bool,
    version: i64,
    created_at: DateTime<Utc>,
}

fn parse_money(column: &str, raw: &str) -> AppResult<Money> {
    let decimal = Decimal::from_str(raw).map_err(|e| AppError::CorruptRecord {
        entity: "account",
        detail: format!("{column}: {e}"),
    })?;
    Money::new(decimal).map_err(|e| AppError::CorruptRecord {
        entity: "account",
        detail: format!("{column}: {e}"),
    })
}

fn parse_uuid(column: &str, raw: &str) -> AppResult<Uuid> {
    raw.parse().map_err(|e| AppError::CorruptRecord {
        entity: "account",
        detail: format!("{column}: {e}"),
    })
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> AppResult<Self> {
        let kind = AccountKind::parse(&row.kind).ok_or_else(|| AppError::CorruptRecord {
            entity: "account",
            detail: format!("kind: {}", row.kind),
        })?;

        Ok(Account {
            id: parse_uuid("id", &row.id)?,
            account_no: row.account_no,
            iban: row.iban,
            kind,
            owner_id: parse_uuid("owner_id", &row.owner_id)?,
            branch_id: row.branch_id,
            currency: row.currency,
            balance: parse_money("balance", &row.balance)?,
            allowed_balance: parse_money("allowed_balance", &row.allowed_balance)?,
            minimum_allowed_balance: parse_money(
                "minimum_allowed_balance",
                &row.minimum_allowed_balance,
            )?,
            debt: parse_money("debt", &row.debt)?,
            disabled: row.disabled,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// Store for account rows.
#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "SELECT id, account_no, iban, kind, owner_id, branch_id, currency, \
     balance, allowed_balance, minimum_allowed_balance, debt, disabled, version, created_at \
     FROM accounts";

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    pub async fn find_by_account_no(&self, account_no: &str) -> AppResult<Option<Account>> {
        let row =
            sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE account_no = ?"))
                .bind(account_no)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Account::try_from).transpose()
    }

    pub async fn find_by_iban(&self, iban: &str) -> AppResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE iban = ?"))
            .bind(iban)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    /// Convenience lookup that turns a missing IBAN into the domain error
    /// every engine operation starts with.
    pub async fn get_by_iban(&self, iban: &str) -> AppResult<Account> {
        self.find_by_iban(iban)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(iban.to_string()).into())
    }

    pub async fn insert(&self, account: &Account) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, account_no, iban, kind, owner_id, branch_id, currency,
                balance, allowed_balance, minimum_allowed_balance, debt,
                disabled, version, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.account_no)
        .bind(&account.iban)
        .bind(account.kind.as_str())
        .bind(account.owner_id.to_string())
        .bind(account.branch_id)
        .bind(&account.currency)
        .bind(account.balance.to_string())
        .bind(account.allowed_balance.to_string())
        .bind(account.minimum_allowed_balance.to_string())
        .bind(account.debt.to_string())
        .bind(account.disabled)
        .bind(account.version)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Full-replace update, guarded by the version the account was read
    /// at. Zero affected rows means another writer got there first.
    /// Returns the account with its version bumped.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        account: &Account,
    ) -> AppResult<Account> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = ?, allowed_balance = ?, minimum_allowed_balance = ?,
                debt = ?, disabled = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(account.balance.to_string())
        .bind(account.allowed_balance.to_string())
        .bind(account.minimum_allowed_balance.to_string())
        .bind(account.debt.to_string())
        .bind(account.disabled)
        .bind(account.id.to_string())
        .bind(account.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT version FROM accounts WHERE id = ?")
                    .bind(account.id.to_string())
                    .fetch_optional(&mut **tx)
                    .await?;

            return match found {
                Some(found) => Err(DomainError::VersionConflict {
                    expected: account.version,
                    found,
                }
                .into()),
                None => Err(DomainError::AccountNotFound(account.iban.clone()).into()),
            };
        }

        let mut updated = account.clone();
        updated.version += 1;
        Ok(updated)
    }

    /// Soft-disable; the row stays for history.
    pub async fn disable(&self, id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE accounts SET disabled = 1, version = version + 1 WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AccountNotFound(id.to_string()).into());
        }
        Ok(())
    }
}
