//! 32.32 fixed-point arithmetic.
//!
//! Prices and tick sizes are `u64` values scaled by 2^32. Quantities are
//! plain integers. Every product is computed in `u128` and checked on the
//! way back down; overflow is [`AuctionError::NumericalOverflow`], never a
//! wrap.

use rust_decimal::Decimal;

use crate::{
    AuctionError, Result,
    constants::{FP32_ONE, FP32_SHIFT},
};

/// `(a * b) >> 32`, rounded down.
pub fn fp32_mul(a: u64, b: u64) -> Result<u64> {
    let product = u128::from(a) * u128::from(b);
    u64::try_from(product >> FP32_SHIFT).map_err(|_| AuctionError::NumericalOverflow)
}

/// `(a * b) >> 32`, rounded up. Used wherever a bidder owes quote so that
/// the vault is never short by a rounding unit.
pub fn fp32_mul_ceil(a: u64, b: u64) -> Result<u64> {
    let product = u128::from(a) * u128::from(b);
    let mask = (1u128 << FP32_SHIFT) - 1;
    let mut shifted = product >> FP32_SHIFT;
    if product & mask != 0 {
        shifted += 1;
    }
    u64::try_from(shifted).map_err(|_| AuctionError::NumericalOverflow)
}

/// `(a << 32) / b`, rounded down.
pub fn fp32_div(a: u64, b: u64) -> Result<u64> {
    if b == 0 {
        return Err(AuctionError::NumericalOverflow);
    }
    let quotient = (u128::from(a) << FP32_SHIFT) / u128::from(b);
    u64::try_from(quotient).map_err(|_| AuctionError::NumericalOverflow)
}

/// Convert a decimal to fixed point, truncating below 2^-32.
pub fn to_fp32(value: Decimal) -> Result<u64> {
    if value.is_sign_negative() {
        return Err(AuctionError::NumericalOverflow);
    }
    let scaled = value
        .checked_mul(Decimal::from(FP32_ONE))
        .ok_or(AuctionError::NumericalOverflow)?
        .trunc();
    u64::try_from(scaled).map_err(|_| AuctionError::NumericalOverflow)
}

/// Fixed point back to a decimal for display and logging.
#[must_use]
pub fn fp32_to_decimal(value: u64) -> Decimal {
    Decimal::from(value) / Decimal::from(FP32_ONE)
}

/// Absolute limit price for a price multiple, i.e. `ticks * tick_size`.
pub fn price_from_ticks(ticks: u64, tick_size: u64) -> Result<u64> {
    ticks
        .checked_mul(tick_size)
        .ok_or(AuctionError::NumericalOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: u64 = 429_496_729; // floor(0.1 * 2^32)

    #[test]
    fn tick_of_one_tenth() {
        assert_eq!(to_fp32(Decimal::new(1, 1)).unwrap(), TICK);
        assert_eq!(price_from_ticks(9, TICK).unwrap(), 3_865_470_561);
        assert_eq!(price_from_ticks(11, TICK).unwrap(), 4_724_464_019);
    }

    #[test]
    fn mul_rounding() {
        let bid = price_from_ticks(11, TICK).unwrap();
        assert_eq!(fp32_mul(1_000_000, bid).unwrap(), 1_099_999);
        assert_eq!(fp32_mul_ceil(1_000_000, bid).unwrap(), 1_100_000);
        // exact products do not round up
        assert_eq!(fp32_mul_ceil(5, FP32_ONE).unwrap(), 5);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            fp32_mul(u64::MAX, u64::MAX),
            Err(AuctionError::NumericalOverflow)
        );
        assert_eq!(
            price_from_ticks(u64::MAX, 2),
            Err(AuctionError::NumericalOverflow)
        );
        assert_eq!(fp32_div(u64::MAX, 1), Err(AuctionError::NumericalOverflow));
        assert_eq!(fp32_div(1, 0), Err(AuctionError::NumericalOverflow));
    }

    #[test]
    fn div_inverts_mul() {
        let two = 2 * FP32_ONE;
        assert_eq!(fp32_div(10, two).unwrap(), 5);
        assert_eq!(fp32_mul(5, two).unwrap(), 10);
    }

    #[test]
    fn decimal_display() {
        assert_eq!(fp32_to_decimal(FP32_ONE / 2), Decimal::new(5, 1));
        assert!(to_fp32(Decimal::new(-1, 0)).is_err());
    }
}
