//! teller-demo
//!
//! End-to-end smoke run against a local SQLite database: bootstraps the
//! schema, seeds two accounts, performs a deposit, an internal transfer,
//! and an EFT, then prints both accounts' statement lines.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use teller_core::account::{Account, AccountKind};
use teller_core::customer::{CustomerDirectory, CustomerName, InMemoryCustomerDirectory};
use teller_core::engine::{DepositCommand, EftTransferCommand, TransferCommand};
use teller_core::statement;
use teller_core::{Config, OperationContext, ResponseEnvelope, TransactionEngine};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teller_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!("Opening database at {}", config.database_url);

    let pool = teller_core::db::create_pool(&config).await?;
    teller_core::db::init_schema(&pool).await?;

    // Seed owners and accounts
    let alice_id = Uuid::new_v4();
    let bob_id = Uuid::new_v4();
    let mut directory = InMemoryCustomerDirectory::new();
    directory.insert(alice_id, CustomerName::new("Alice", "Demir"));
    directory.insert(bob_id, CustomerName::new("Bob", "Kaya"));
    let directory: Arc<dyn CustomerDirectory> = Arc::new(directory);

    let engine = TransactionEngine::new(pool.clone(), Arc::clone(&directory));

    let alice = Account::open(
        "1001",
        "TR330006100519786457841326",
        AccountKind::Current,
        alice_id,
        "TRY",
    );
    let bob = Account::open(
        "1002",
        "TR640001200931200000202051",
        AccountKind::Current,
        bob_id,
        "TRY",
    );
    engine.accounts().insert(&alice).await?;
    engine.accounts().insert(&bob).await?;

    let teller = OperationContext::new("teller-demo");

    // Deposit 1000 TRY to Alice
    let receipt = engine
        .deposit(
            &DepositCommand::new(&alice.iban, "1000").with_description("opening deposit"),
            &teller,
        )
        .await?;
    tracing::info!("deposit receipt: {receipt:?}");

    // Alice sends Bob 300 internally
    let receipt = engine
        .transfer(
            &TransferCommand::new(&alice.iban, &bob.iban, "300").with_description("rent"),
            &teller,
        )
        .await?;
    tracing::info!("transfer receipt: {receipt:?}");

    // Alice sends Bob 200 via EFT (0.15% commission)
    let receipt = engine
        .eft_transfer(
            &EftTransferCommand::new(&alice.iban, &bob.iban, "200", "Bob", "Kaya"),
            &teller,
        )
        .await?;
    tracing::info!("EFT receipt: {receipt:?}");

    // Print both statements, plus the wire form a caller would receive
    for account in [&alice, &bob] {
        println!("\nStatement for {} ({}):", account.account_no, account.iban);
        let entries = engine.ledger().entries_for_iban(&account.iban, 30).await?;
        let mut lines = Vec::with_capacity(entries.len());
        for entry in &entries {
            let sender = directory
                .name_of(alice_id)
                .map(|n| n.full())
                .unwrap_or_default();
            let recipient = directory
                .name_of(bob_id)
                .map(|n| n.full())
                .unwrap_or_default();
            let line = statement::assemble(entry, &account.iban, &sender, &recipient);
            println!(
                "  {:>10}  {}  balance: {}",
                line.amount, line.summary, line.remaining_balance
            );
            lines.push(line);
        }
        let envelope: ResponseEnvelope<_> = ResponseEnvelope::ok(lines);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }

    pool.close().await;
    Ok(())
}
