//! Decimal money helpers.
//!
//! CRITICAL: never use floating-point for money. Every amount in this
//! workspace is a `rust_decimal::Decimal`; this module exists only to
//! centralize the two decimal-specific operations the specification calls
//! out by name: rounding to 2dp and epsilon-tolerant equality at 0.005.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The tolerance below which two amounts are treated as equal for
/// reconciliation and cube-consistency purposes.
pub const AMOUNT_EPSILON: Decimal = dec!(0.005);

/// Rounds an amount to 2 decimal places using banker's rounding, matching
/// the precision every persisted amount in this system is stored at.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Returns true if `a` and `b` differ by no more than [`AMOUNT_EPSILON`].
///
/// Never compares via `abs()` of a difference derived from anything but
/// plain decimal subtraction -- `abs` itself stays a presentation-layer
/// concern everywhere else in the balance engine (section 4.2 of the spec).
#[must_use]
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= AMOUNT_EPSILON
}

/// Returns the signed difference `actual - expected`, useful for building
/// reconciliation adjustment amounts while keeping the sign convention
/// explicit at call sites.
#[must_use]
pub fn difference(actual: Decimal, expected: Decimal) -> Decimal {
    actual - expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(dec!(1.005)), dec!(1.00));
        assert_eq!(round2(dec!(1.015)), dec!(1.02));
        assert_eq!(round2(dec!(-3.456)), dec!(-3.46));
    }

    #[test]
    fn test_approx_eq_within_epsilon() {
        assert!(approx_eq(dec!(100.00), dec!(100.005)));
        assert!(approx_eq(dec!(100.00), dec!(99.995)));
        assert!(approx_eq(dec!(100.00), dec!(100.00)));
    }

    #[test]
    fn test_approx_eq_outside_epsilon() {
        assert!(!approx_eq(dec!(100.00), dec!(100.01)));
        assert!(!approx_eq(dec!(100.00), dec!(99.99)));
    }

    #[test]
    fn test_difference_sign_convention() {
        assert_eq!(difference(dec!(1000.00), dec!(980.00)), dec!(20.00));
        assert_eq!(difference(dec!(980.00), dec!(1000.00)), dec!(-20.00));
    }
}
