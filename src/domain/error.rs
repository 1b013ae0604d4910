//! Domain Error Types
//!
//! Business-rule violations, independent of the persistence layer.

use thiserror::Error;

/// Number of days a savings deposit must be held before it can unlock a
/// withdrawal.
pub const SAVINGS_LOCKIN_DAYS: i64 = 180;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Insufficient usable balance for a debit
    #[error("balance is not enough: required {required}, available {available}")]
    InsufficientBalance {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Account is soft-disabled
    #[error("Account is disabled: {iban}")]
    AccountDisabled { iban: String },

    /// No account with the given IBAN
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Operation requires a Current or Recurring account
    #[error("Account type '{kind}' cannot send transfers")]
    InvalidAccountKind { kind: String },

    /// Invalid amount (unparseable, zero, negative, or out of range)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Transfer where sender and recipient are the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// EFT recipient name does not match the target account owner
    #[error("Recipient name does not match the target account")]
    RecipientNameMismatch,

    /// Savings withdrawal blocked: no deposit has matured past the
    /// lock-in period
    #[error("Savings lock-in: no deposit older than {SAVINGS_LOCKIN_DAYS} days")]
    SavingsLockIn,

    /// Interest accrual requested on a non-savings account
    #[error("Interest accrual applies to savings accounts only")]
    NotSavingsAccount,

    /// Stale account version detected at commit time
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: i64, found: i64 },

    /// Ledger append referencing an IBAN with no account row
    #[error("Ledger entry references unknown IBAN: {0}")]
    UnknownIban(String),
}

impl DomainError {
    pub fn insufficient_balance(
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    ) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::VersionConflict { .. })
    }

    /// Check if this is a conflict error (retry may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}
