//! Database module
//!
//! Pool construction and schema bootstrap for the SQLite backing store.
//! Monetary columns are TEXT: SQLite has no decimal type and floats are
//! not acceptable for balances, so `Decimal` values round-trip as strings.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::config::Config;

/// Open a connection pool, creating the database file if missing.
pub async fn create_pool(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_with(options)
        .await
}

/// Create tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id                      TEXT PRIMARY KEY,
            account_no              TEXT NOT NULL UNIQUE,
            iban                    TEXT NOT NULL UNIQUE,
            kind                    TEXT NOT NULL,
            owner_id                TEXT NOT NULL,
            branch_id               INTEGER NOT NULL DEFAULT 0,
            currency                TEXT NOT NULL,
            balance                 TEXT NOT NULL,
            allowed_balance         TEXT NOT NULL,
            minimum_allowed_balance TEXT NOT NULL DEFAULT '0.00',
            debt                    TEXT NOT NULL DEFAULT '0.00',
            disabled                INTEGER NOT NULL DEFAULT 0,
            version                 INTEGER NOT NULL DEFAULT 1,
            created_at              TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cash_transactions (
            id                  TEXT PRIMARY KEY,
            kind                TEXT NOT NULL,
            initiated_by        TEXT NOT NULL,
            from_ref            TEXT NOT NULL,
            to_ref              TEXT NOT NULL,
            amount              TEXT NOT NULL,
            sender_remaining    TEXT NOT NULL,
            recipient_remaining TEXT NOT NULL,
            payment_kind        TEXT NOT NULL,
            description         TEXT NOT NULL,
            transaction_date    TEXT NOT NULL,
            created_by          TEXT NOT NULL,
            card_no             TEXT,
            disabled            INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_cash_tx_from ON cash_transactions(from_ref)",
        "CREATE INDEX IF NOT EXISTS idx_cash_tx_to ON cash_transactions(to_ref)",
        "CREATE INDEX IF NOT EXISTS idx_cash_tx_date ON cash_transactions(transaction_date)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    for table in ["accounts", "cash_transactions"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
