//! Conversion between decimal currency units and integer minor units (cents).
//!
//! Drafts keep amounts as `Decimal` for display and arithmetic; the backend
//! payload carries cents. Rounding is half away from zero, so any amount with
//! at most two decimal places survives `to_minor_units` → `from_minor_units`
//! unchanged.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

const CENTS_PER_UNIT: i64 = 100;

/// `round(amount * 100)` as an `i64`.
pub fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    let scaled = amount
        .checked_mul(Decimal::from(CENTS_PER_UNIT))
        .ok_or_else(|| DomainError::out_of_range(amount.to_string()))?;

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| DomainError::out_of_range(amount.to_string()))
}

/// `cents / 100` with a scale of two decimal places.
pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_whole_amounts() {
        assert_eq!(to_minor_units(dec!(230.00)).unwrap(), 23000);
        assert_eq!(from_minor_units(23000), dec!(230.00));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec!(0.005)).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(0.004)).unwrap(), 0);
        assert_eq!(to_minor_units(dec!(-0.005)).unwrap(), -1);
    }

    #[test]
    fn rejects_amounts_beyond_i64() {
        let err = to_minor_units(Decimal::MAX).unwrap_err();
        assert!(matches!(err, DomainError::AmountOutOfRange(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 500,
            ..ProptestConfig::default()
        })]

        #[test]
        fn two_decimal_amounts_round_trip(cents in -10_000_000_000i64..10_000_000_000i64) {
            let amount = Decimal::new(cents, 2);
            let minor = to_minor_units(amount).unwrap();
            prop_assert_eq!(minor, cents);
            prop_assert_eq!(from_minor_units(minor), amount);
        }
    }
}
