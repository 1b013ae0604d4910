//! Command definitions
//!
//! Commands carry the caller-supplied request fields into the engine.
//! Amounts travel as strings (the wire format is decimal-as-string) and
//! are parsed and validated inside the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;
use crate::ledger::{InitiatingAsset, PaymentKind, TransactionKind};

/// Command to deposit cash into an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub to_iban: String,
    /// Amount as string for precise decimal
    pub amount: String,
    pub initiated_by: InitiatingAsset,
    pub payment_kind: PaymentKind,
    pub description: Option<String>,
    pub card_no: Option<String>,
}

impl DepositCommand {
    pub fn new(to_iban: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            to_iban: to_iban.into(),
            amount: amount.into(),
            initiated_by: InitiatingAsset::Account,
            payment_kind: PaymentKind::Cash,
            description: None,
            card_no: None,
        }
    }

    pub fn via(mut self, initiated_by: InitiatingAsset, payment_kind: PaymentKind) -> Self {
        self.initiated_by = initiated_by;
        self.payment_kind = payment_kind;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_card_no(mut self, card_no: impl Into<String>) -> Self {
        self.card_no = Some(card_no.into());
        self
    }
}

/// Command to withdraw cash from an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub from_iban: String,
    pub amount: String,
    pub initiated_by: InitiatingAsset,
    pub payment_kind: PaymentKind,
    pub description: Option<String>,
    pub card_no: Option<String>,
}

impl WithdrawCommand {
    pub fn new(from_iban: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            from_iban: from_iban.into(),
            amount: amount.into(),
            initiated_by: InitiatingAsset::Account,
            payment_kind: PaymentKind::Cash,
            description: None,
            card_no: None,
        }
    }

    pub fn via(mut self, initiated_by: InitiatingAsset, payment_kind: PaymentKind) -> Self {
        self.initiated_by = initiated_by;
        self.payment_kind = payment_kind;
        self
    }

    pub fn with_card_no(mut self, card_no: impl Into<String>) -> Self {
        self.card_no = Some(card_no.into());
        self
    }
}

/// Command for an internal transfer between two accounts of this bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from_iban: String,
    pub to_iban: String,
    pub amount: String,
    pub description: Option<String>,
}

impl TransferCommand {
    pub fn new(
        from_iban: impl Into<String>,
        to_iban: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            from_iban: from_iban.into(),
            to_iban: to_iban.into(),
            amount: amount.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Command for an EFT transfer to another bank, subject to commission.
/// The recipient name must match the owner of the target account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EftTransferCommand {
    pub from_iban: String,
    pub to_iban: String,
    pub amount: String,
    pub recipient_first_name: String,
    pub recipient_last_name: String,
    pub description: Option<String>,
}

impl EftTransferCommand {
    pub fn new(
        from_iban: impl Into<String>,
        to_iban: impl Into<String>,
        amount: impl Into<String>,
        recipient_first_name: impl Into<String>,
        recipient_last_name: impl Into<String>,
    ) -> Self {
        Self {
            from_iban: from_iban.into(),
            to_iban: to_iban.into(),
            amount: amount.into(),
            recipient_first_name: recipient_first_name.into(),
            recipient_last_name: recipient_last_name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of a committed money movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub entry_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    /// Sender balance after commit; zero for deposits
    pub sender_remaining: Money,
    /// Recipient balance after commit; zero for withdrawals
    pub recipient_remaining: Money,
    /// Commission deducted, EFT only
    pub fee: Option<Money>,
    /// Ledger entry recording the commission, EFT only
    pub fee_entry_id: Option<Uuid>,
    pub committed_at: DateTime<Utc>,
}

/// Result of an interest accrual run over a savings account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualReceipt {
    pub iban: String,
    /// Total profit credited; zero when nothing matured or the currency
    /// is not priced
    pub profit: Money,
    /// Ledger entry recording the credit, present only when profit > 0
    pub entry_id: Option<Uuid>,
}

impl AccrualReceipt {
    pub fn no_op(iban: impl Into<String>) -> Self {
        Self {
            iban: iban.into(),
            profit: Money::zero(),
            entry_id: None,
        }
    }
}
