//! Transaction Engine
//!
//! The sole writer of account balances and ledger rows. Every operation
//! is one database transaction: fresh reads, business checks, the
//! version-checked balance update(s), the ledger append(s), and a final
//! cancellation check, then a single commit. Any failure before commit
//! rolls the whole unit back, so the store never holds a balance change
//! without its ledger entry or vice versa.

mod commands;
pub mod interest;

pub use commands::{
    AccrualReceipt, DepositCommand, EftTransferCommand, TransactionReceipt, TransferCommand,
    WithdrawCommand,
};

use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::account::{Account, AccountKind, AccountStore};
use crate::customer::CustomerDirectory;
use crate::domain::{DomainError, Money, OperationContext, SAVINGS_LOCKIN_DAYS};
use crate::error::{AppError, AppResult};
use crate::ledger::{InitiatingAsset, LedgerEntry, LedgerStore, PaymentKind, TransactionKind};

/// Attempts per operation before a version conflict is surfaced.
const MAX_RETRIES: u32 = 3;

/// The money-movement engine.
pub struct TransactionEngine {
    pool: SqlitePool,
    accounts: AccountStore,
    ledger: LedgerStore,
    customers: Arc<dyn CustomerDirectory>,
}

impl TransactionEngine {
    pub fn new(pool: SqlitePool, customers: Arc<dyn CustomerDirectory>) -> Self {
        Self {
            accounts: AccountStore::new(pool.clone()),
            ledger: LedgerStore::new(pool.clone()),
            customers,
            pool,
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    // =========================================================================
    // Deposit
    // =========================================================================

    /// Deposit cash into the account with the given IBAN.
    pub async fn deposit(
        &self,
        command: &DepositCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        self.with_retry("deposit", || self.try_deposit(command, context))
            .await
    }

    async fn try_deposit(
        &self,
        command: &DepositCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        let amount = parse_amount(&command.amount)?;

        let mut to_account = self.accounts.get_by_iban(&command.to_iban).await?;
        to_account.ensure_active()?;
        to_account
            .credit(&amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        let to_account = self.accounts.update(&mut tx, &to_account).await?;

        let mut entry = LedgerEntry::new(
            TransactionKind::Deposit,
            command.initiated_by,
            context.acting_user.clone(),
            &to_account.iban,
            amount,
            command.payment_kind,
            command.description.clone().unwrap_or_default(),
            context.acting_user.clone(),
        );
        entry.recipient_remaining = to_account.balance;
        if let Some(card_no) = &command.card_no {
            entry = entry.with_card_no(card_no);
        }
        self.ledger.append(&mut tx, &entry).await?;

        ensure_not_cancelled(context)?;
        tx.commit().await?;

        tracing::info!(
            iban = %to_account.iban,
            amount = %amount,
            entry_id = %entry.id,
            "deposit committed"
        );

        Ok(TransactionReceipt {
            entry_id: entry.id,
            kind: TransactionKind::Deposit,
            amount,
            sender_remaining: Money::zero(),
            recipient_remaining: to_account.balance,
            fee: None,
            fee_entry_id: None,
            committed_at: entry.transaction_date,
        })
    }

    // =========================================================================
    // Withdrawal
    // =========================================================================

    /// Withdraw cash from the account with the given IBAN. Savings
    /// accounts are subject to the deposit lock-in rule.
    pub async fn withdraw(
        &self,
        command: &WithdrawCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        self.with_retry("withdraw", || self.try_withdraw(command, context))
            .await
    }

    async fn try_withdraw(
        &self,
        command: &WithdrawCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        let amount = parse_amount(&command.amount)?;

        let mut from_account = self.accounts.get_by_iban(&command.from_iban).await?;
        from_account.ensure_active()?;

        if from_account.kind == AccountKind::Savings {
            self.ensure_lockin_satisfied(&from_account.iban).await?;
        }

        ensure_sufficient(&from_account, &amount)?;
        from_account
            .debit(&amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        let from_account = self.accounts.update(&mut tx, &from_account).await?;

        let mut entry = LedgerEntry::new(
            TransactionKind::Withdrawal,
            command.initiated_by,
            &from_account.iban,
            context.acting_user.clone(),
            amount,
            command.payment_kind,
            command.description.clone().unwrap_or_default(),
            context.acting_user.clone(),
        );
        entry.sender_remaining = from_account.balance;
        if let Some(card_no) = &command.card_no {
            entry = entry.with_card_no(card_no);
        }
        self.ledger.append(&mut tx, &entry).await?;

        ensure_not_cancelled(context)?;
        tx.commit().await?;

        tracing::info!(
            iban = %from_account.iban,
            amount = %amount,
            entry_id = %entry.id,
            "withdrawal committed"
        );

        Ok(TransactionReceipt {
            entry_id: entry.id,
            kind: TransactionKind::Withdrawal,
            amount,
            sender_remaining: from_account.balance,
            recipient_remaining: Money::zero(),
            fee: None,
            fee_entry_id: None,
            committed_at: entry.transaction_date,
        })
    }

    /// The lock-in rule as observed in production: the withdrawal is
    /// unblocked if ANY deposit on the account is old enough, regardless
    /// of which funds the withdrawal actually draws on.
    async fn ensure_lockin_satisfied(&self, iban: &str) -> AppResult<()> {
        let deposits = self.ledger.deposits_for_iban(iban).await?;
        let now = Utc::now();

        let any_matured = deposits.iter().any(|entry| {
            (now - entry.transaction_date).num_days() >= SAVINGS_LOCKIN_DAYS
        });

        if any_matured {
            Ok(())
        } else {
            Err(DomainError::SavingsLockIn.into())
        }
    }

    // =========================================================================
    // Internal transfer
    // =========================================================================

    /// Transfer between two accounts of this bank. Only current and
    /// recurring accounts may send.
    pub async fn transfer(
        &self,
        command: &TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        self.with_retry("transfer", || self.try_transfer(command, context))
            .await
    }

    async fn try_transfer(
        &self,
        command: &TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        let amount = parse_amount(&command.amount)?;
        let (mut from_account, mut to_account) =
            self.load_transfer_pair(&command.from_iban, &command.to_iban, &amount).await?;

        apply_transfer(&mut from_account, &mut to_account, &amount)?;

        let mut tx = self.pool.begin().await?;
        let from_account = self.accounts.update(&mut tx, &from_account).await?;
        let to_account = self.accounts.update(&mut tx, &to_account).await?;

        let mut entry = LedgerEntry::new(
            TransactionKind::Transfer,
            InitiatingAsset::Account,
            &from_account.iban,
            &to_account.iban,
            amount,
            PaymentKind::Cash,
            command.description.clone().unwrap_or_default(),
            context.acting_user.clone(),
        );
        entry.sender_remaining = from_account.balance;
        entry.recipient_remaining = to_account.balance;
        self.ledger.append(&mut tx, &entry).await?;

        ensure_not_cancelled(context)?;
        tx.commit().await?;

        tracing::info!(
            from = %from_account.iban,
            to = %to_account.iban,
            amount = %amount,
            entry_id = %entry.id,
            "transfer committed"
        );

        Ok(TransactionReceipt {
            entry_id: entry.id,
            kind: TransactionKind::Transfer,
            amount,
            sender_remaining: from_account.balance,
            recipient_remaining: to_account.balance,
            fee: None,
            fee_entry_id: None,
            committed_at: entry.transaction_date,
        })
    }

    // =========================================================================
    // EFT transfer
    // =========================================================================

    /// Transfer to an account held at another bank. The recipient name
    /// must match the target account's owner, and a commission of 0.15%
    /// is deducted from the sender in the same commit.
    pub async fn eft_transfer(
        &self,
        command: &EftTransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        self.with_retry("eft_transfer", || self.try_eft_transfer(command, context))
            .await
    }

    async fn try_eft_transfer(
        &self,
        command: &EftTransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionReceipt> {
        let amount = parse_amount(&command.amount)?;
        let (mut from_account, mut to_account) =
            self.load_transfer_pair(&command.from_iban, &command.to_iban, &amount).await?;

        let recipient_name = self
            .customers
            .name_of(to_account.owner_id)
            .ok_or(DomainError::RecipientNameMismatch)?;
        if !recipient_name.matches(&command.recipient_first_name, &command.recipient_last_name) {
            return Err(DomainError::RecipientNameMismatch.into());
        }

        apply_transfer(&mut from_account, &mut to_account, &amount)?;

        let fee = interest::eft_commission(&amount);

        let mut tx = self.pool.begin().await?;
        let from_account = self.accounts.update(&mut tx, &from_account).await?;
        let to_account = self.accounts.update(&mut tx, &to_account).await?;

        let mut entry = LedgerEntry::new(
            TransactionKind::Eft,
            InitiatingAsset::Account,
            &from_account.iban,
            &to_account.iban,
            amount,
            PaymentKind::Cash,
            command.description.clone().unwrap_or_default(),
            context.acting_user.clone(),
        );
        entry.sender_remaining = from_account.balance;
        entry.recipient_remaining = to_account.balance;
        self.ledger.append(&mut tx, &entry).await?;

        // Commission comes out of the sender after the primary entry, in
        // the same commit.
        let mut from_account = from_account;
        from_account
            .debit(&fee)
            .map_err(|_| {
                DomainError::insufficient_balance(
                    fee.value(),
                    from_account.allowed_balance.value(),
                )
            })?;
        let from_account = self.accounts.update(&mut tx, &from_account).await?;

        let mut fee_entry = LedgerEntry::new(
            TransactionKind::CommissionFees,
            InitiatingAsset::Account,
            &from_account.iban,
            interest::EFT_FEE_ACCOUNT_NO,
            fee,
            PaymentKind::Cash,
            "EFT commission fee",
            context.acting_user.clone(),
        );
        fee_entry.sender_remaining = from_account.balance;
        self.ledger.append(&mut tx, &fee_entry).await?;

        ensure_not_cancelled(context)?;
        tx.commit().await?;

        tracing::info!(
            from = %from_account.iban,
            to = %to_account.iban,
            amount = %amount,
            fee = %fee,
            entry_id = %entry.id,
            "EFT transfer committed"
        );

        Ok(TransactionReceipt {
            entry_id: entry.id,
            kind: TransactionKind::Eft,
            amount,
            sender_remaining: from_account.balance,
            recipient_remaining: to_account.balance,
            fee: Some(fee),
            fee_entry_id: Some(fee_entry.id),
            committed_at: entry.transaction_date,
        })
    }

    // =========================================================================
    // Interest accrual
    // =========================================================================

    /// Credit net interest profits on a savings account: every deposit
    /// entry earns its holding-period rate for the account currency.
    /// Currencies outside the rate table make the whole run a no-op.
    pub async fn accrue_interest(
        &self,
        iban: &str,
        context: &OperationContext,
    ) -> AppResult<AccrualReceipt> {
        self.with_retry("accrue_interest", || self.try_accrue_interest(iban, context))
            .await
    }

    async fn try_accrue_interest(
        &self,
        iban: &str,
        context: &OperationContext,
    ) -> AppResult<AccrualReceipt> {
        let mut account = self.accounts.get_by_iban(iban).await?;
        account.ensure_active()?;

        if account.kind != AccountKind::Savings {
            return Err(DomainError::NotSavingsAccount.into());
        }

        let Some(currency) = crate::domain::Currency::from_code(&account.currency) else {
            tracing::warn!(
                iban = %account.iban,
                currency = %account.currency,
                "currency not in rate table, skipping accrual"
            );
            return Ok(AccrualReceipt::no_op(iban));
        };

        let deposits = self.ledger.deposits_for_iban(iban).await?;
        let now = Utc::now();

        let mut profit = Money::zero();
        for deposit in &deposits {
            let days_held = (now - deposit.transaction_date).num_days();
            let earned = interest::deposit_profit(currency, days_held, &deposit.amount);
            profit = profit
                .credit(&earned)
                .map_err(|e| AppError::Internal(format!("accrual overflow: {e}")))?;
        }

        if profit.is_zero() {
            return Ok(AccrualReceipt::no_op(iban));
        }

        account
            .credit_balance_only(&profit)
            .map_err(|e| AppError::Internal(format!("accrual overflow: {e}")))?;

        let mut tx = self.pool.begin().await?;
        let account = self.accounts.update(&mut tx, &account).await?;

        let mut entry = LedgerEntry::new(
            TransactionKind::InterestPayout,
            InitiatingAsset::Account,
            "interest",
            &account.iban,
            profit,
            PaymentKind::Cash,
            "Net interest profit",
            context.acting_user.clone(),
        );
        entry.recipient_remaining = account.balance;
        self.ledger.append(&mut tx, &entry).await?;

        ensure_not_cancelled(context)?;
        tx.commit().await?;

        tracing::info!(
            iban = %account.iban,
            profit = %profit,
            entry_id = %entry.id,
            "interest accrual committed"
        );

        Ok(AccrualReceipt {
            iban: iban.to_string(),
            profit,
            entry_id: Some(entry.id),
        })
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    async fn load_transfer_pair(
        &self,
        from_iban: &str,
        to_iban: &str,
        amount: &Money,
    ) -> AppResult<(Account, Account)> {
        if from_iban == to_iban {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let from_account = self.accounts.get_by_iban(from_iban).await?;
        let to_account = self.accounts.get_by_iban(to_iban).await?;
        from_account.ensure_active()?;
        to_account.ensure_active()?;

        if !from_account.kind.can_send_transfers() {
            return Err(DomainError::InvalidAccountKind {
                kind: from_account.kind.as_str().to_string(),
            }
            .into());
        }

        ensure_sufficient(&from_account, amount)?;

        Ok((from_account, to_account))
    }

    /// Retry on version conflicts with backoff, the same shape the rest
    /// of an operation's failure handling has: the failed attempt rolled
    /// back, a fresh attempt re-reads fresh state.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        for attempt in 0..MAX_RETRIES {
            match attempt_fn().await {
                Err(AppError::Domain(DomainError::VersionConflict { .. })) => {
                    tracing::warn!(
                        operation,
                        "version conflict (attempt {}/{})",
                        attempt + 1,
                        MAX_RETRIES
                    );
                    if attempt + 1 < MAX_RETRIES {
                        let delay = Duration::from_millis(50 * (attempt as u64 + 1));
                        tokio::time::sleep(delay).await;
                    }
                }
                other => return other,
            }
        }

        Err(AppError::MaxRetriesExceeded)
    }
}

fn parse_amount(raw: &str) -> AppResult<Money> {
    let amount: Money = raw
        .parse()
        .map_err(|e: crate::domain::MoneyError| DomainError::InvalidAmount(e.to_string()))?;
    if amount.is_zero() {
        return Err(DomainError::InvalidAmount("amount must be positive".to_string()).into());
    }
    Ok(amount)
}

fn ensure_sufficient(account: &Account, amount: &Money) -> Result<(), DomainError> {
    if !account.allowed_balance.is_sufficient_for(amount) {
        return Err(DomainError::insufficient_balance(
            amount.value(),
            account.allowed_balance.value(),
        ));
    }
    Ok(())
}

// The sender loses both balances; the recipient gains balance only.
// Transferred funds become usable through the recipient's own flows, not
// at receive time. Cash deposits are the operation that credits both.
fn apply_transfer(
    from_account: &mut Account,
    to_account: &mut Account,
    amount: &Money,
) -> Result<(), AppError> {
    from_account
        .debit(amount)
        .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;
    to_account
        .credit_balance_only(amount)
        .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;
    Ok(())
}

fn ensure_not_cancelled(context: &OperationContext) -> AppResult<()> {
    if context.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}
