//! Account entity
//!
//! An account holds the current and usable balance for one IBAN. Rows are
//! never deleted, only soft-disabled, and every balance mutation bumps the
//! optimistic-concurrency version checked at update time.

mod store;

pub use store::AccountStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DomainError, Money, MoneyError};

/// Account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Current,
    Savings,
    Recurring,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Current => "current",
            AccountKind::Savings => "savings",
            AccountKind::Recurring => "recurring",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "current" => Some(AccountKind::Current),
            "savings" => Some(AccountKind::Savings),
            "recurring" => Some(AccountKind::Recurring),
            _ => None,
        }
    }

    /// Only current and recurring accounts may send transfers; savings
    /// balances leave through withdrawals.
    pub fn can_send_transfers(&self) -> bool {
        matches!(self, AccountKind::Current | AccountKind::Recurring)
    }
}

/// A bank account.
///
/// Invariant: `allowed_balance <= balance`. `allowed_balance` is the part
/// of the balance not held back by debt or holds; every sufficiency check
/// runs against it, never against the raw balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub account_no: String,
    pub iban: String,
    pub kind: AccountKind,
    pub owner_id: Uuid,
    pub branch_id: i64,
    /// Raw currency code; codes outside the rate table are legal and make
    /// interest accrual a no-op
    pub currency: String,
    pub balance: Money,
    pub allowed_balance: Money,
    pub minimum_allowed_balance: Money,
    pub debt: Money,
    pub disabled: bool,
    /// Optimistic-concurrency counter, bumped on every update
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with a zero balance.
    pub fn open(
        account_no: impl Into<String>,
        iban: impl Into<String>,
        kind: AccountKind,
        owner_id: Uuid,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_no: account_no.into(),
            iban: iban.into(),
            kind,
            owner_id,
            branch_id: 0,
            currency: currency.into(),
            balance: Money::zero(),
            allowed_balance: Money::zero(),
            minimum_allowed_balance: Money::zero(),
            debt: Money::zero(),
            disabled: false,
            version: 1,
            created_at: Utc::now(),
        }
    }

    /// Fail if the account is soft-disabled.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.disabled {
            return Err(DomainError::AccountDisabled {
                iban: self.iban.clone(),
            });
        }
        Ok(())
    }

    /// Credit both the balance and the usable balance.
    pub fn credit(&mut self, amount: &Money) -> Result<(), MoneyError> {
        self.balance = self.balance.credit(amount)?;
        self.allowed_balance = self.allowed_balance.credit(amount)?;
        Ok(())
    }

    /// Credit the balance only, leaving the usable balance untouched.
    /// Used for incoming transfers and interest profits; only cash
    /// deposits make funds immediately usable.
    pub fn credit_balance_only(&mut self, amount: &Money) -> Result<(), MoneyError> {
        self.balance = self.balance.credit(amount)?;
        Ok(())
    }

    /// Debit both the balance and the usable balance. The caller checks
    /// sufficiency against `allowed_balance` first; this still refuses to
    /// go negative.
    pub fn debit(&mut self, amount: &Money) -> Result<(), MoneyError> {
        self.balance = self.balance.debit(amount)?;
        self.allowed_balance = self.allowed_balance.debit(amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(kind: AccountKind) -> Account {
        Account::open("1001", "TR330006100519786457841326", kind, Uuid::new_v4(), "TRY")
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [AccountKind::Current, AccountKind::Savings, AccountKind::Recurring] {
            assert_eq!(AccountKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountKind::parse("checking"), None);
    }

    #[test]
    fn test_transfer_capability() {
        assert!(AccountKind::Current.can_send_transfers());
        assert!(AccountKind::Recurring.can_send_transfers());
        assert!(!AccountKind::Savings.can_send_transfers());
    }

    #[test]
    fn test_credit_and_debit_move_both_balances() {
        let mut acc = account(AccountKind::Current);
        acc.credit(&"500".parse().unwrap()).unwrap();
        assert_eq!(acc.balance, "500".parse().unwrap());
        assert_eq!(acc.allowed_balance, "500".parse().unwrap());

        acc.debit(&"120".parse().unwrap()).unwrap();
        assert_eq!(acc.balance, "380".parse().unwrap());
        assert_eq!(acc.allowed_balance, "380".parse().unwrap());
    }

    #[test]
    fn test_balance_only_credit_keeps_invariant() {
        let mut acc = account(AccountKind::Savings);
        acc.credit(&"100".parse().unwrap()).unwrap();
        acc.credit_balance_only(&"15".parse().unwrap()).unwrap();

        assert_eq!(acc.balance, "115".parse().unwrap());
        assert_eq!(acc.allowed_balance, "100".parse().unwrap());
        assert!(acc.allowed_balance <= acc.balance);
    }

    #[test]
    fn test_disabled_account_rejected() {
        let mut acc = account(AccountKind::Current);
        assert!(acc.ensure_active().is_ok());
        acc.disabled = true;
        assert!(matches!(
            acc.ensure_active(),
            Err(DomainError::AccountDisabled { .. })
        ));
    }
}
