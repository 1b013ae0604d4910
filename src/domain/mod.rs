//! Domain module
//!
//! Pure domain types: money, currencies, operation context, and
//! business-rule errors. Nothing in here touches the database.

mod context;
mod currency;
mod error;
mod money;

pub use context::{CancellationHandle, OperationContext};
pub use currency::Currency;
pub use error::{DomainError, SAVINGS_LOCKIN_DAYS};
pub use money::{Money, MoneyError};
