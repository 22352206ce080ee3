//! Conversion between decimal prices and the integer tick counts the book
//! matches on. Keeping the matching loop on integers removes any
//! floating/decimal comparator nondeterminism (see `SPEC_FULL.md` §9).

use rust_decimal::Decimal;

/// Converts `price` to a tick count against `tick_size`, reporting whether
/// `price` was an exact multiple of `tick_size`.
///
/// Returns `None` only if `tick_size` is non-positive or the tick count
/// would overflow `i64` — both programmer errors the caller is expected to
/// have already ruled out (`tick_size` is validated once at
/// [`crate::book::OrderBookConfig`] construction).
pub(crate) fn decimal_to_ticks(price: Decimal, tick_size: Decimal) -> Option<(i64, bool)> {
    if tick_size <= Decimal::ZERO {
        return None;
    }
    let ratio = price / tick_size;
    let rounded = ratio.round();
    let aligned = rounded == ratio;
    let ticks = i64::try_from(rounded).ok()?;
    Some((ticks, aligned))
}

/// The decimal price a tick count represents under `tick_size`.
pub(crate) fn ticks_to_decimal(ticks: i64, tick_size: Decimal) -> Decimal {
    Decimal::from(ticks) * tick_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn exact_multiple_is_aligned() {
        let (ticks, aligned) = decimal_to_ticks(dec!(10.05), dec!(0.05)).unwrap();
        assert_eq!(ticks, 201);
        assert!(aligned);
        assert_eq!(ticks_to_decimal(ticks, dec!(0.05)), dec!(10.05));
    }

    #[test]
    fn off_by_one_ulp_is_misaligned() {
        let (_, aligned) = decimal_to_ticks(dec!(10.03), dec!(0.05)).unwrap();
        assert!(!aligned);
    }

    #[test]
    fn default_cent_tick_size() {
        let (ticks, aligned) = decimal_to_ticks(dec!(10.00), dec!(0.01)).unwrap();
        assert_eq!(ticks, 1000);
        assert!(aligned);
    }

    #[test]
    fn non_positive_tick_size_rejected() {
        assert!(decimal_to_ticks(dec!(10.00), dec!(0.00)).is_none());
        assert!(decimal_to_ticks(dec!(10.00), dec!(-0.01)).is_none());
    }
}
