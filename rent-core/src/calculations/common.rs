//! Common utility functions for take-home calculations.
//!
//! This module provides shared functionality used across the tax and
//! affordability calculators, including rounding and other common operations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to a whole unit using half-up rounding.
///
/// Values at exactly .5 always round toward positive infinity, so `2.5`
/// becomes `3` and `-2.5` becomes `-2`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rent_core::calculations::common::round_to_whole;
///
/// assert_eq!(round_to_whole(dec!(1980.4)), dec!(1980));
/// assert_eq!(round_to_whole(dec!(1980.5)), dec!(1981));
/// assert_eq!(round_to_whole(dec!(9800.025)), dec!(9800));
/// assert_eq!(round_to_whole(dec!(-100.5)), dec!(-100));
/// ```
pub fn round_to_whole(value: Decimal) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(0, strategy)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rent_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-5), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
