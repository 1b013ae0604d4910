//! Statement assembly
//!
//! Turns a committed ledger entry into the line a customer sees on their
//! statement: the amount signed from their side of the movement, their
//! remaining-balance snapshot, and a readable summary built from the
//! sender/recipient display names the customer collaborator resolved.
//! Pure functions; nothing here touches a store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Money;
use crate::ledger::{InitiatingAsset, LedgerEntry, PaymentKind, TransactionKind};

/// One rendered statement line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub entry_id: Uuid,
    pub kind: TransactionKind,
    pub from: String,
    pub to: String,
    /// Signed from the viewpoint account: credits positive, debits
    /// negative
    pub amount: Decimal,
    /// The viewpoint account's balance right after this entry committed
    pub remaining_balance: Money,
    pub sender: String,
    pub recipient: String,
    pub payment_kind: PaymentKind,
    pub initiated_by: InitiatingAsset,
    /// Rendered human-readable summary
    pub summary: String,
    /// Caller-supplied free text carried from the entry
    pub memo: String,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
}

/// Render one entry as seen from `viewpoint_iban`. The display names are
/// resolved by the caller's customer lookup; this stays a pure function
/// of its inputs.
pub fn assemble(
    entry: &LedgerEntry,
    viewpoint_iban: &str,
    sender_name: &str,
    recipient_name: &str,
) -> StatementLine {
    let is_credit = entry.to_ref == viewpoint_iban;

    let amount = if is_credit {
        entry.amount.value()
    } else {
        -entry.amount.value()
    };

    let remaining_balance = if is_credit {
        entry.recipient_remaining
    } else {
        entry.sender_remaining
    };

    StatementLine {
        entry_id: entry.id,
        kind: entry.kind,
        from: entry.from_ref.clone(),
        to: entry.to_ref.clone(),
        amount,
        remaining_balance,
        sender: sender_name.to_string(),
        recipient: recipient_name.to_string(),
        payment_kind: entry.payment_kind,
        initiated_by: entry.initiated_by,
        summary: summarize(entry, is_credit, sender_name, recipient_name),
        memo: entry.description.clone(),
        created_on: entry.transaction_date,
        created_by: entry.created_by.clone(),
    }
}

fn summarize(
    entry: &LedgerEntry,
    is_credit: bool,
    sender_name: &str,
    recipient_name: &str,
) -> String {
    match entry.kind {
        TransactionKind::Deposit => match &entry.card_no {
            Some(card_no) => format!(
                "{} deposit: card No: {}, {}",
                channel_label(entry.initiated_by),
                mask_card_no(card_no),
                recipient_name
            ),
            None => format!("Deposit by {sender_name}"),
        },
        TransactionKind::Withdrawal => match &entry.card_no {
            Some(card_no) => format!(
                "{} withdrawal: card No: {}, {}",
                channel_label(entry.initiated_by),
                mask_card_no(card_no),
                sender_name
            ),
            None => format!("Withdrawal by {sender_name}"),
        },
        TransactionKind::Transfer | TransactionKind::Eft => {
            if is_credit {
                format!("From: {}, Account No: {}", sender_name, entry.from_ref)
            } else {
                format!("To: {}, Account No: {}", recipient_name, entry.to_ref)
            }
        }
        TransactionKind::CommissionFees => {
            format!("Commission fee: {}", entry.description)
        }
        TransactionKind::InterestPayout => entry.description.clone(),
    }
}

fn channel_label(initiated_by: InitiatingAsset) -> &'static str {
    match initiated_by {
        InitiatingAsset::Atm => "ATM",
        InitiatingAsset::Pos => "POS",
        InitiatingAsset::Account => "Branch",
    }
}

/// Mask a card number down to its last four digits.
fn mask_card_no(card_no: &str) -> String {
    let digits: String = card_no.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return format!("****{digits}");
    }
    format!("****{}", &digits[digits.len() - 4..])
}
