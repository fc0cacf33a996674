//! Internal helpers for validation and monetary arithmetic.
//!
//! These utilities are **not** part of the public API. They centralize the
//! small pure rules the transaction engine relies on so every operation
//! enforces them identically.

use crate::{EngineError, ResultEngine};

/// Phone numbers are 11-digit numeric strings; validated before any store
/// mutation.
pub(crate) fn validate_phone(phone: &str) -> ResultEngine<()> {
    if phone.len() == 11 && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(EngineError::InvalidPhone(format!(
            "expected 11 digits, got {phone:?}"
        )))
    }
}

/// Applies a point-level discount to an amount in minor units, rounding to
/// the nearest cent. A missing level means no discount.
pub(crate) fn discounted_minor(amount_minor: i64, discount: Option<f64>) -> i64 {
    match discount {
        Some(multiplier) => ((amount_minor as f64) * multiplier).round() as i64,
        None => amount_minor,
    }
}

/// Points accrued by a monetary recharge: 10 points per currency unit,
/// floored. Amounts are non-negative here.
pub(crate) fn points_for_recharge(amount_minor: i64) -> i64 {
    amount_minor / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_eleven_digits() {
        assert!(validate_phone("13812345678").is_ok());
        assert!(validate_phone("1381234567").is_err());
        assert!(validate_phone("138123456789").is_err());
        assert!(validate_phone("1381234567a").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn discount_rounds_to_nearest_cent() {
        // 30.00 at 95% -> 28.50
        assert_eq!(discounted_minor(3000, Some(0.95)), 2850);
        // 0.99 at 85% -> 0.8415 -> 0.84
        assert_eq!(discounted_minor(99, Some(0.85)), 84);
        // 0.10 at 85% -> 0.085 -> rounds up to 0.09
        assert_eq!(discounted_minor(10, Some(0.85)), 9);
        assert_eq!(discounted_minor(3000, None), 3000);
    }

    #[test]
    fn points_accrue_at_ten_per_unit_floored() {
        // 100.00 -> 1000 points
        assert_eq!(points_for_recharge(10_000), 1000);
        // 0.15 -> 1.5 -> 1 point
        assert_eq!(points_for_recharge(15), 1);
        assert_eq!(points_for_recharge(9), 0);
    }
}
