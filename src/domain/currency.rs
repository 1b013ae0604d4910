//! Supported currencies
//!
//! Accounts store their currency as a raw code string; this enum is the
//! set of codes the interest engine knows how to price. Codes outside the
//! set are not an error; accrual treats them as a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency codes with a configured interest-rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// Turkish lira
    Try,
    /// US dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Resolve an account's currency code. Returns `None` for codes the
    /// rate table does not cover.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "TRY" | "TL" => Some(Currency::Try),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
