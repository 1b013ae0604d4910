//! Engine integration tests
//!
//! Exercise each money-movement operation against a real (in-memory)
//! database and verify committed state by re-reading the stores.

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{
    directory_with, engine, seed_account, seed_deposit_entry, seed_interest_entry, setup_test_db,
};
use teller_core::account::AccountKind;
use teller_core::engine::{DepositCommand, EftTransferCommand, TransferCommand, WithdrawCommand};
use teller_core::ledger::TransactionKind;
use teller_core::{AppError, DomainError, ErrorKind, OperationContext, TransactionEngine};

const IBAN_1: &str = "TR0001";
const IBAN_2: &str = "TR0002";

fn ctx() -> OperationContext {
    OperationContext::new("test-teller")
}

#[tokio::test]
async fn deposit_credits_balance_and_appends_entry() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "200").await;

    let receipt = eng
        .deposit(&DepositCommand::new(IBAN_2, "500"), &ctx())
        .await
        .unwrap();

    assert_eq!(receipt.kind, TransactionKind::Deposit);
    assert!(receipt.sender_remaining.is_zero());
    assert_eq!(receipt.recipient_remaining.value(), dec!(700));

    let account = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(account.balance.value(), dec!(700));
    assert_eq!(account.allowed_balance.value(), dec!(700));

    let entry = eng.ledger().find_by_id(receipt.entry_id).await.unwrap().unwrap();
    assert_eq!(entry.recipient_remaining.value(), dec!(700));
    assert!(entry.sender_remaining.is_zero());
}

#[tokio::test]
async fn deposit_to_unknown_iban_is_not_found() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);

    let err = eng
        .deposit(&DepositCommand::new("TR9999", "500"), &ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.code(), "account_not_found");
}

#[tokio::test]
async fn transfer_conserves_balances_and_appends_one_entry() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "1000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "200").await;

    let receipt = eng
        .transfer(&TransferCommand::new(IBAN_1, IBAN_2, "300"), &ctx())
        .await
        .unwrap();

    let sender = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    let recipient = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(sender.balance.value(), dec!(700));
    assert_eq!(recipient.balance.value(), dec!(500));

    let entry = eng.ledger().find_by_id(receipt.entry_id).await.unwrap().unwrap();
    assert_eq!(entry.sender_remaining.value(), dec!(700));
    assert_eq!(entry.recipient_remaining.value(), dec!(500));

    // Exactly one entry was appended
    assert_eq!(eng.ledger().entries_for_iban(IBAN_1, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn transfer_credits_recipient_balance_only() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "1000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "200").await;

    eng.transfer(&TransferCommand::new(IBAN_1, IBAN_2, "300"), &ctx())
        .await
        .unwrap();

    let sender = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(sender.balance.value(), dec!(700));
    assert_eq!(sender.allowed_balance.value(), dec!(700));

    // The received funds land in the balance without becoming usable
    let recipient = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(recipient.balance.value(), dec!(500));
    assert_eq!(recipient.allowed_balance.value(), dec!(200));
}

#[tokio::test]
async fn worked_example_two_accounts() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "1000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "200").await;

    eng.deposit(&DepositCommand::new(IBAN_2, "500"), &ctx()).await.unwrap();
    let after_deposit = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(after_deposit.balance.value(), dec!(700));

    eng.transfer(&TransferCommand::new(IBAN_1, IBAN_2, "300"), &ctx())
        .await
        .unwrap();

    let sender = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    let recipient = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(sender.balance.value(), dec!(700));
    assert_eq!(recipient.balance.value(), dec!(1000));

    let entries = eng.ledger().entries_for_iban(IBAN_2, 1).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, TransactionKind::Deposit);
    assert_eq!(entries[1].kind, TransactionKind::Transfer);
}

#[tokio::test]
async fn eft_fee_is_deterministic_and_double_entried() {
    let pool = setup_test_db().await;
    let bob = Uuid::new_v4();
    let eng = TransactionEngine::new(pool.clone(), directory_with(&[(bob, "Bob", "Kaya")]));
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "10000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, bob, "TRY", "0").await;

    let receipt = eng
        .eft_transfer(
            &EftTransferCommand::new(IBAN_1, IBAN_2, "1000", "Bob", "Kaya"),
            &ctx(),
        )
        .await
        .unwrap();

    // fee = round(1000 * 0.0015) = 1.50
    assert_eq!(receipt.fee.unwrap().value(), dec!(1.50));

    let sender = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(sender.balance.value(), dec!(8998.50));

    let recipient = eng.accounts().get_by_iban(IBAN_2).await.unwrap();
    assert_eq!(recipient.balance.value(), dec!(1000));

    let fee_entry = eng
        .ledger()
        .find_by_id(receipt.fee_entry_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fee_entry.kind, TransactionKind::CommissionFees);
    assert_eq!(fee_entry.to_ref, "9001001");
    assert_eq!(fee_entry.sender_remaining.value(), dec!(8998.50));

    // Two entries on the sender side: transfer + commission
    assert_eq!(eng.ledger().entries_for_iban(IBAN_1, 1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn eft_recipient_name_mismatch_leaves_state_untouched() {
    let pool = setup_test_db().await;
    let bob = Uuid::new_v4();
    let eng = TransactionEngine::new(pool.clone(), directory_with(&[(bob, "Bob", "Kaya")]));
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "1000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, bob, "TRY", "0").await;

    let err = eng
        .eft_transfer(
            &EftTransferCommand::new(IBAN_1, IBAN_2, "100", "Robert", "Kaya"),
            &ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "recipient_name_mismatch");
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let sender = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(sender.balance.value(), dec!(1000));
    assert!(eng.ledger().entries_for_iban(IBAN_1, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_funds_rejects_without_partial_writes() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "100").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "0").await;

    let err = eng
        .withdraw(&WithdrawCommand::new(IBAN_1, "100.01"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "insufficient_balance");
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = eng
        .transfer(&TransferCommand::new(IBAN_1, IBAN_2, "500"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "insufficient_balance");

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(100));
    assert_eq!(account.allowed_balance.value(), dec!(100));
    assert!(eng.ledger().entries_for_iban(IBAN_1, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn savings_withdrawal_blocked_until_a_deposit_matures() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1000").await;
    seed_deposit_entry(&pool, IBAN_1, "1000", 30).await;

    let err = eng
        .withdraw(&WithdrawCommand::new(IBAN_1, "100"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "savings_lock_in");
    assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(1000));
}

// @known-ambiguity: the lock-in check unblocks the withdrawal if ANY
// deposit on the account is old enough, regardless of which funds the
// withdrawal actually draws on. A 10-lira deposit from last year unlocks
// the entire balance, including money deposited yesterday. This mirrors
// the observed production behavior; the intended rule was probably
// per-deposit.
#[tokio::test]
async fn savings_withdrawal_unlocked_by_any_matured_deposit() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1010").await;
    seed_deposit_entry(&pool, IBAN_1, "10", 200).await;
    seed_deposit_entry(&pool, IBAN_1, "1000", 1).await;

    let receipt = eng
        .withdraw(&WithdrawCommand::new(IBAN_1, "900"), &ctx())
        .await
        .unwrap();

    assert_eq!(receipt.sender_remaining.value(), dec!(110));
    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(110));
}

#[tokio::test]
async fn savings_account_cannot_send_transfers() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1000").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "0").await;

    let err = eng
        .transfer(&TransferCommand::new(IBAN_1, IBAN_2, "100"), &ctx())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "invalid_account_kind");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn recurring_account_can_send_transfers() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Recurring, Uuid::new_v4(), "TRY", "500").await;
    seed_account(&eng, "1002", IBAN_2, AccountKind::Current, Uuid::new_v4(), "TRY", "0").await;

    assert!(eng
        .transfer(&TransferCommand::new(IBAN_1, IBAN_2, "100"), &ctx())
        .await
        .is_ok());
}

#[tokio::test]
async fn same_account_transfer_rejected() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "500").await;

    let err = eng
        .transfer(&TransferCommand::new(IBAN_1, IBAN_1, "100"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "same_account_transfer");
}

#[tokio::test]
async fn disabled_account_rejects_operations() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    let account =
        seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "500")
            .await;
    eng.accounts().disable(account.id).await.unwrap();

    let err = eng
        .deposit(&DepositCommand::new(IBAN_1, "100"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "account_disabled");
}

#[tokio::test]
async fn cancelled_context_aborts_before_commit() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "500").await;

    let context = ctx();
    context.cancellation_handle().cancel();

    let err = eng
        .deposit(&DepositCommand::new(IBAN_1, "100"), &context)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled));

    // Rollback left nothing behind
    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(500));
    assert!(eng.ledger().entries_for_iban(IBAN_1, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_amounts_rejected() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "500").await;

    for bad in ["0", "-10", "abc", "1.234"] {
        let err = eng
            .deposit(&DepositCommand::new(IBAN_1, bad), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_amount", "amount {bad:?}");
    }
}

#[tokio::test]
async fn interest_accrual_credits_matured_deposits() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1000").await;
    // Tier 1 (0.15): 1000 * 0.15 = 150. Too-fresh deposit earns nothing.
    seed_deposit_entry(&pool, IBAN_1, "1000", 200).await;
    seed_deposit_entry(&pool, IBAN_1, "500", 10).await;

    let receipt = eng.accrue_interest(IBAN_1, &ctx()).await.unwrap();
    assert_eq!(receipt.profit.value(), dec!(150));

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(1150));
    // Interest is not immediately usable on a locked savings account
    assert_eq!(account.allowed_balance.value(), dec!(1000));

    let entry = eng
        .ledger()
        .find_by_id(receipt.entry_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.kind, TransactionKind::InterestPayout);
    assert_eq!(entry.description, "Net interest profit");
}

#[tokio::test]
async fn interest_payout_does_not_satisfy_lock_in() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1000").await;
    // A long-aged payout and a fresh customer deposit: still locked.
    seed_interest_entry(&pool, IBAN_1, "50", 200).await;
    seed_deposit_entry(&pool, IBAN_1, "1000", 1).await;

    let err = eng
        .withdraw(&WithdrawCommand::new(IBAN_1, "900"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "savings_lock_in");

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(1000));
}

#[tokio::test]
async fn interest_accrual_ignores_prior_payouts() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "TRY", "1000").await;
    // Only a matured payout on record: nothing earns interest.
    seed_interest_entry(&pool, IBAN_1, "1000", 200).await;

    let receipt = eng.accrue_interest(IBAN_1, &ctx()).await.unwrap();
    assert!(receipt.profit.is_zero());
    assert!(receipt.entry_id.is_none());

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(1000));
}

#[tokio::test]
async fn interest_accrual_tier2_rate() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "USD", "2000").await;
    // Tier 2 USD (0.03): 2000 * 0.03 = 60
    seed_deposit_entry(&pool, IBAN_1, "2000", 400).await;

    let receipt = eng.accrue_interest(IBAN_1, &ctx()).await.unwrap();
    assert_eq!(receipt.profit.value(), dec!(60));
}

#[tokio::test]
async fn interest_accrual_unknown_currency_is_silent_noop() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Savings, Uuid::new_v4(), "GBP", "1000").await;
    seed_deposit_entry(&pool, IBAN_1, "1000", 200).await;

    let receipt = eng.accrue_interest(IBAN_1, &ctx()).await.unwrap();
    assert!(receipt.profit.is_zero());
    assert!(receipt.entry_id.is_none());

    let account = eng.accounts().get_by_iban(IBAN_1).await.unwrap();
    assert_eq!(account.balance.value(), dec!(1000));
}

#[tokio::test]
async fn interest_accrual_requires_savings_account() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);
    seed_account(&eng, "1001", IBAN_1, AccountKind::Current, Uuid::new_v4(), "TRY", "1000").await;

    let err = eng.accrue_interest(IBAN_1, &ctx()).await.unwrap_err();
    assert_eq!(err.code(), "not_savings_account");
    assert!(matches!(
        err,
        AppError::Domain(DomainError::NotSavingsAccount)
    ));
}

#[tokio::test]
async fn envelope_reports_engine_errors() {
    let pool = setup_test_db().await;
    let eng = engine(&pool);

    let result = eng.deposit(&DepositCommand::new("TR9999", "10"), &ctx()).await;
    let envelope: teller_core::ResponseEnvelope<_> = result.into();

    assert!(!envelope.success());
    assert_eq!(envelope.errors[0].code, "account_not_found");
    assert_eq!(envelope.errors[0].field_name.as_deref(), Some("iban"));
}
