//! Common test utilities

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use teller_core::account::{Account, AccountKind};
use teller_core::customer::{CustomerDirectory, CustomerName, InMemoryCustomerDirectory};
use teller_core::ledger::{InitiatingAsset, LedgerEntry, LedgerStore, PaymentKind, TransactionKind};
use teller_core::TransactionEngine;

/// Open a fresh in-memory database with the schema applied.
///
/// A single connection is required: every connection of an in-memory
/// SQLite pool would otherwise open its own empty database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    teller_core::db::init_schema(&pool)
        .await
        .expect("Failed to create schema");

    pool
}

/// Directory resolving the given owner ids to display names.
pub fn directory_with(owners: &[(Uuid, &str, &str)]) -> Arc<dyn CustomerDirectory> {
    let mut directory = InMemoryCustomerDirectory::new();
    for (id, first, last) in owners {
        directory.insert(*id, CustomerName::new(*first, *last));
    }
    Arc::new(directory)
}

/// Engine over the pool with an empty customer directory.
pub fn engine(pool: &SqlitePool) -> TransactionEngine {
    TransactionEngine::new(pool.clone(), directory_with(&[]))
}

/// Insert an account with the given opening balance (balance and usable
/// balance both set).
pub async fn seed_account(
    eng: &TransactionEngine,
    account_no: &str,
    iban: &str,
    kind: AccountKind,
    owner_id: Uuid,
    currency: &str,
    opening_balance: &str,
) -> Account {
    let mut account = Account::open(account_no, iban, kind, owner_id, currency);
    if opening_balance != "0" {
        account
            .credit(&opening_balance.parse().expect("bad opening balance"))
            .expect("bad opening balance");
    }
    eng.accounts().insert(&account).await.expect("seed account");
    account
}

/// Append a deposit entry dated `days_ago` in the past, outside the
/// engine. Used to shape lock-in and accrual histories.
pub async fn seed_deposit_entry(pool: &SqlitePool, iban: &str, amount: &str, days_ago: i64) {
    let ledger = LedgerStore::new(pool.clone());

    let mut entry = LedgerEntry::new(
        TransactionKind::Deposit,
        InitiatingAsset::Account,
        "seed",
        iban,
        amount.parse().expect("bad amount"),
        PaymentKind::Cash,
        "seeded deposit",
        "seed",
    );
    entry.transaction_date = Utc::now() - Duration::days(days_ago);
    entry.recipient_remaining = entry.amount;

    let mut tx = pool.begin().await.expect("begin");
    ledger.append(&mut tx, &entry).await.expect("append seed deposit");
    tx.commit().await.expect("commit");
}

/// Append an interest-payout entry dated `days_ago` in the past, the
/// shape an accrual run records.
pub async fn seed_interest_entry(pool: &SqlitePool, iban: &str, amount: &str, days_ago: i64) {
    let ledger = LedgerStore::new(pool.clone());

    let mut entry = LedgerEntry::new(
        TransactionKind::InterestPayout,
        InitiatingAsset::Account,
        "interest",
        iban,
        amount.parse().expect("bad amount"),
        PaymentKind::Cash,
        "Net interest profit",
        "interest",
    );
    entry.transaction_date = Utc::now() - Duration::days(days_ago);
    entry.recipient_remaining = entry.amount;

    let mut tx = pool.begin().await.expect("begin");
    ledger.append(&mut tx, &entry).await.expect("append seed interest");
    tx.commit().await.expect("commit");
}
