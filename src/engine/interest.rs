//! Interest-rate table and commission math
//!
//! Savings deposits earn interest by currency and holding period: a
//! deposit held 180–365 days earns the tier-1 rate, 365–720 days the
//! tier-2 rate, anything outside those buckets earns nothing. Currencies
//! absent from the table earn nothing at all; accrual over them is a
//! documented no-op, not an error.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{Currency, Money};

/// Lower bound (inclusive) of the tier-1 holding bucket, in days.
pub const TIER1_MIN_DAYS: i64 = 180;
/// Boundary between the tier-1 and tier-2 buckets, in days.
pub const TIER2_MIN_DAYS: i64 = 365;
/// Upper bound (exclusive) of the tier-2 bucket, in days.
pub const TIER2_MAX_DAYS: i64 = 720;

/// EFT commission rate: 0.15% of the transferred amount.
pub const EFT_COMMISSION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 4);

/// Account number of the internal bank-fee account every EFT commission
/// is booked against.
pub const EFT_FEE_ACCOUNT_NO: &str = "9001001";

/// Annualized interest rate for a deposit of the given currency held for
/// `days_held` days. Zero outside the holding buckets.
pub fn rate_for(currency: Currency, days_held: i64) -> Decimal {
    let (tier1, tier2) = match currency {
        // (180–365 days, 365–720 days)
        Currency::Try => (Decimal::new(15, 2), Decimal::new(19, 2)),
        Currency::Usd => (Decimal::new(2, 2), Decimal::new(3, 2)),
        Currency::Eur => (Decimal::new(1, 2), Decimal::new(2, 2)),
    };

    if (TIER1_MIN_DAYS..TIER2_MIN_DAYS).contains(&days_held) {
        tier1
    } else if (TIER2_MIN_DAYS..TIER2_MAX_DAYS).contains(&days_held) {
        tier2
    } else {
        Decimal::ZERO
    }
}

/// Profit earned by a single deposit: rate × amount, rounded to minor
/// units.
pub fn deposit_profit(currency: Currency, days_held: i64, amount: &Money) -> Money {
    let raw = rate_for(currency, days_held) * amount.value();
    round_to_minor_units(raw)
}

/// Commission charged on an EFT transfer: `round(amount × 0.0015)`.
pub fn eft_commission(amount: &Money) -> Money {
    round_to_minor_units(amount.value() * EFT_COMMISSION_RATE)
}

fn round_to_minor_units(value: Decimal) -> Money {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Rounding a product of validated non-negative values stays in range.
    Money::new(rounded).unwrap_or_else(|_| Money::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_commission_rate_constant() {
        assert_eq!(EFT_COMMISSION_RATE, dec!(0.0015));
    }

    #[test]
    fn test_eft_commission_rounding() {
        // 10000 * 0.0015 = 15.00
        assert_eq!(eft_commission(&"10000".parse().unwrap()).value(), dec!(15.00));
        // 1000 * 0.0015 = 1.50
        assert_eq!(eft_commission(&"1000".parse().unwrap()).value(), dec!(1.50));
        // 123.45 * 0.0015 = 0.185175 -> 0.19
        assert_eq!(eft_commission(&"123.45".parse().unwrap()).value(), dec!(0.19));
        // Tiny amounts round to zero
        assert_eq!(eft_commission(&"1".parse().unwrap()).value(), dec!(0.00));
    }

    #[test]
    fn test_rate_buckets() {
        assert_eq!(rate_for(Currency::Try, 179), Decimal::ZERO);
        assert_eq!(rate_for(Currency::Try, 180), dec!(0.15));
        assert_eq!(rate_for(Currency::Try, 364), dec!(0.15));
        assert_eq!(rate_for(Currency::Try, 365), dec!(0.19));
        assert_eq!(rate_for(Currency::Try, 719), dec!(0.19));
        assert_eq!(rate_for(Currency::Try, 720), Decimal::ZERO);

        assert_eq!(rate_for(Currency::Usd, 200), dec!(0.02));
        assert_eq!(rate_for(Currency::Eur, 400), dec!(0.02));
    }

    #[test]
    fn test_deposit_profit() {
        // 1000 TRY held 200 days at 0.15 = 150.00
        assert_eq!(
            deposit_profit(Currency::Try, 200, &"1000".parse().unwrap()).value(),
            dec!(150.00)
        );
        // Out of bucket earns nothing
        assert!(deposit_profit(Currency::Try, 10, &"1000".parse().unwrap()).is_zero());
    }
}
