//! Ledger entries
//!
//! Every committed money movement becomes one immutable row in the
//! `cash_transactions` table: the amount, both IBAN-side references, and
//! the sender/recipient balances snapshotted at commit time. Rows are
//! never updated or physically deleted; correction happens by appending,
//! removal by soft-disable.

mod store;

pub use store::LedgerStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

/// Kind of money movement an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    Eft,
    CommissionFees,
    /// Interest credited by an accrual run. Kept distinct from customer
    /// deposits so the lock-in and accrual scans never pick it up.
    InterestPayout,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Eft => "eft",
            TransactionKind::CommissionFees => "commission_fees",
            TransactionKind::InterestPayout => "interest_payout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TransactionKind::Deposit),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            "transfer" => Some(TransactionKind::Transfer),
            "eft" => Some(TransactionKind::Eft),
            "commission_fees" => Some(TransactionKind::CommissionFees),
            "interest_payout" => Some(TransactionKind::InterestPayout),
            _ => None,
        }
    }

    /// Which sides of the entry reference a real account row and must
    /// pass the referential check on append. The other side is a free
    /// counterparty label (the cash depositor, the internal fee account).
    pub fn account_sides(&self) -> (bool, bool) {
        match self {
            TransactionKind::Deposit | TransactionKind::InterestPayout => (false, true),
            TransactionKind::Withdrawal => (true, false),
            TransactionKind::Transfer | TransactionKind::Eft => (true, true),
            TransactionKind::CommissionFees => (true, false),
        }
    }
}

/// Channel a transaction was initiated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiatingAsset {
    Atm,
    Pos,
    Account,
}

impl InitiatingAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiatingAsset::Atm => "atm",
            InitiatingAsset::Pos => "pos",
            InitiatingAsset::Account => "account",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "atm" => Some(InitiatingAsset::Atm),
            "pos" => Some(InitiatingAsset::Pos),
            "account" => Some(InitiatingAsset::Account),
            _ => None,
        }
    }
}

/// How the funds were presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    Cash,
    DebitCard,
    CreditCard,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Cash => "cash",
            PaymentKind::DebitCard => "debit_card",
            PaymentKind::CreditCard => "credit_card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentKind::Cash),
            "debit_card" => Some(PaymentKind::DebitCard),
            "credit_card" => Some(PaymentKind::CreditCard),
            _ => None,
        }
    }
}

/// One immutable money-movement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub initiated_by: InitiatingAsset,
    /// Sender IBAN, or a counterparty label for deposits
    pub from_ref: String,
    /// Recipient IBAN, or the internal fee account number for commissions
    pub to_ref: String,
    pub amount: Money,
    /// Sender balance after commit; zero when there is no sender account
    pub sender_remaining: Money,
    /// Recipient balance after commit; zero when there is no recipient
    /// account
    pub recipient_remaining: Money,
    pub payment_kind: PaymentKind,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub created_by: String,
    pub card_no: Option<String>,
    pub disabled: bool,
}

impl LedgerEntry {
    /// New entry dated now. The engine fills the balance snapshots after
    /// the account mutation and before the append.
    pub fn new(
        kind: TransactionKind,
        initiated_by: InitiatingAsset,
        from_ref: impl Into<String>,
        to_ref: impl Into<String>,
        amount: Money,
        payment_kind: PaymentKind,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            initiated_by,
            from_ref: from_ref.into(),
            to_ref: to_ref.into(),
            amount,
            sender_remaining: Money::zero(),
            recipient_remaining: Money::zero(),
            payment_kind,
            description: description.into(),
            transaction_date: Utc::now(),
            created_by: created_by.into(),
            card_no: None,
            disabled: false,
        }
    }

    pub fn with_card_no(mut self, card_no: impl Into<String>) -> Self {
        self.card_no = Some(card_no.into());
        self
    }

    /// Whether the given IBAN is on one of the entry's sides.
    pub fn involves(&self, iban: &str) -> bool {
        self.from_ref == iban || self.to_ref == iban
    }
}
