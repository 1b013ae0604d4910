//! Ledger store
//!
//! Append-only. Appends run inside the caller's transaction so the entry
//! and the balance update it snapshots commit or roll back together.
//! Account-side references are checked against the accounts table before
//! insert: a caller-supplied IBAN with no account row is rejected instead
//! of trusted.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{DomainError, Money};
use crate::error::{AppError, AppResult};

use super::{InitiatingAsset, LedgerEntry, PaymentKind, TransactionKind};

/// Row type for the `cash_transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRow {
    id: String,
    kind: String,
    initiated_by: String,
    from_ref: String,
    to_ref: String,
    amount: String,
    sender_remaining: String,
    recipient_remaining: String,
    payment_kind: String,
    description: String,
    transaction_date: DateTime<Utc>,
    created_by: String,
    card_no: Option<String>,
    disabled: bool,
}

fn corrupt(detail: String) -> AppError {
    AppError::CorruptRecord {
        entity: "ledger entry",
        detail,
    }
}

fn parse_money(column: &str, raw: &str) -> AppResult<Money> {
    let decimal =
        Decimal::from_str(raw).map_err(|e| corrupt(format!("{column}: {e}")))?;
    Money::new(decimal).map_err(|e| corrupt(format!("{column}: {e}")))
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> AppResult<Self> {
        Ok(LedgerEntry {
            id: row
                .id
                .parse()
                .map_err(|e| corrupt(format!("id: {e}")))?,
            kind: TransactionKind::parse(&row.kind)
                .ok_or_else(|| corrupt(format!("kind: {}", row.kind)))?,
            initiated_by: InitiatingAsset::parse(&row.initiated_by)
                .ok_or_else(|| corrupt(format!("initiated_by: {}", row.initiated_by)))?,
            from_ref: row.from_ref,
            to_ref: row.to_ref,
            amount: parse_money("amount", &row.amount)?,
            sender_remaining: parse_money("sender_remaining", &row.sender_remaining)?,
            recipient_remaining: parse_money("recipient_remaining", &row.recipient_remaining)?,
            payment_kind: PaymentKind::parse(&row.payment_kind)
                .ok_or_else(|| corrupt(format!("payment_kind: {}", row.payment_kind)))?,
            description: row.description,
            transaction_date: row.transaction_date,
            created_by: row.created_by,
            card_no: row.card_no,
            disabled: row.disabled,
        })
    }
}

/// Store for ledger rows.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "SELECT id, kind, initiated_by, from_ref, to_ref, amount, \
     sender_remaining, recipient_remaining, payment_kind, description, transaction_date, \
     created_by, card_no, disabled FROM cash_transactions";

impl LedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry inside the caller's transaction. The sides the
    /// entry kind marks as account references must exist.
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        entry: &LedgerEntry,
    ) -> AppResult<()> {
        let (check_from, check_to) = entry.kind.account_sides();
        if check_from {
            self.ensure_iban_exists(tx, &entry.from_ref).await?;
        }
        if check_to {
            self.ensure_iban_exists(tx, &entry.to_ref).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO cash_transactions (
                id, kind, initiated_by, from_ref, to_ref, amount,
                sender_remaining, recipient_remaining, payment_kind,
                description, transaction_date, created_by, card_no, disabled
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.kind.as_str())
        .bind(entry.initiated_by.as_str())
        .bind(&entry.from_ref)
        .bind(&entry.to_ref)
        .bind(entry.amount.to_string())
        .bind(entry.sender_remaining.to_string())
        .bind(entry.recipient_remaining.to_string())
        .bind(entry.payment_kind.as_str())
        .bind(&entry.description)
        .bind(entry.transaction_date)
        .bind(&entry.created_by)
        .bind(entry.card_no.as_deref())
        .bind(entry.disabled)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn ensure_iban_exists(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        iban: &str,
    ) -> AppResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE iban = ?)")
                .bind(iban)
                .fetch_one(&mut **tx)
                .await?;

        if !exists {
            return Err(DomainError::UnknownIban(iban.to_string()).into());
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(LedgerEntry::try_from).transpose()
    }

    /// Most recent active entry touching the IBAN on either side.
    pub async fn last_for_iban(&self, iban: &str) -> AppResult<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!(
            "{SELECT_COLUMNS} WHERE (from_ref = ? OR to_ref = ?) AND disabled = 0 \
             ORDER BY transaction_date DESC, id DESC LIMIT 1"
        ))
        .bind(iban)
        .bind(iban)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LedgerEntry::try_from).transpose()
    }

    /// Active entries touching the IBAN within the last `n` days, in
    /// stable chronological order (ties broken by id), so two reads with
    /// no intervening writes return identical results.
    pub async fn entries_for_iban(&self, iban: &str, last_n_days: i64) -> AppResult<Vec<LedgerEntry>> {
        let cutoff = Utc::now() - Duration::days(last_n_days);

        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "{SELECT_COLUMNS} WHERE (from_ref = ? OR to_ref = ?) \
             AND transaction_date >= ? AND disabled = 0 \
             ORDER BY transaction_date ASC, id ASC"
        ))
        .bind(iban)
        .bind(iban)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// All active customer deposit entries credited to the IBAN, oldest
    /// first. Feeds the savings lock-in check and interest accrual;
    /// interest payouts carry their own kind and never appear here.
    pub async fn deposits_for_iban(&self, iban: &str) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "{SELECT_COLUMNS} WHERE to_ref = ? AND kind = 'deposit' AND disabled = 0 \
             ORDER BY transaction_date ASC, id ASC"
        ))
        .bind(iban)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Soft-disable; the row stays for audit.
    pub async fn disable(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE cash_transactions SET disabled = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!("ledger entry not found: {id}")));
        }
        Ok(())
    }
}
