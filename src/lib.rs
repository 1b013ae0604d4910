//! teller-core
//!
//! Money-movement core of a retail banking backend: deposits,
//! withdrawals, internal and EFT transfers with commission accounting,
//! and savings interest accrual. The surrounding HTTP layer is out of
//! scope; it talks to this crate through engine commands, receipts,
//! statement lines, and the response envelope.

pub mod account;
pub mod config;
pub mod customer;
pub mod db;
pub mod domain;
pub mod engine;
pub mod ledger;
pub mod response;
pub mod statement;

mod error;

pub use config::Config;
pub use domain::{CancellationHandle, Currency, DomainError, Money, MoneyError, OperationContext};
pub use engine::TransactionEngine;
pub use error::{AppError, AppResult, ErrorKind};
pub use response::{ErrorItem, ResponseEnvelope};
