//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Round a ratio to a fixed number of decimal places, halves away from zero.
pub fn round_ratio(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Express a fraction as a percentage (0.0325 -> 3.25).
pub fn to_percent(ratio: Decimal) -> Decimal {
    (ratio * dec!(100)).normalize()
}
