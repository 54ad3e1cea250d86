//! # Money
//!
//! Every price, discount, payment and report figure is an `i64` count of
//! cents. Percentages are basis points (`1500` = 15%).
//!
//! ```text
//! Product.selling_price_cents ──► CartLine (× qty) ──► Cart.subtotal
//!                                                          │
//!                     − manual discount − coupon discount  │
//!                                                          ▼
//!                               Cart.total ──► TenderLedger ──► change_due
//! ```
//!
//! Rounding happens in exactly one place, [`Money::percentage_of`]:
//! half away from zero on the cent.
//!
//! ```rust
//! use pharmapos_core::money::Money;
//!
//! let subtotal = Money::from_cents(1999);
//! let coupon = subtotal.percentage_of(1500); // 299.85 → 300
//! assert_eq!((subtotal - coupon).cents(), 1699);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::BPS_SCALE;

/// An amount in cents. Serializes as a bare integer.
///
/// Signed, so intermediate values such as profit after a large discount
/// can go below zero; amounts shown to the customer go through
/// [`clamp_non_negative`](Money::clamp_non_negative).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `max(0, self)`
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Line total for `qty` units at this unit price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `bps` basis points of this amount, rounded half away from zero.
    ///
    /// Computed in i128 so a large subtotal times 10 000 cannot overflow.
    pub fn percentage_of(&self, bps: i64) -> Money {
        let scale = i128::from(BPS_SCALE);
        let raw = i128::from(self.0) * i128::from(bps);
        let half = if raw >= 0 { scale / 2 } else { -scale / 2 };
        Money::from_cents(((raw + half) / scale) as i64)
    }

    /// `self / whole × 100` for margins and chart bars; 0.0 when `whole`
    /// is not positive (a day with no sales).
    pub fn ratio_percent(&self, whole: Money) -> f64 {
        if whole.0 <= 0 {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_no_currency_symbol() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_line_arithmetic() {
        let unit = Money::from_cents(299);
        assert_eq!(unit.multiply_quantity(3).cents(), 897);
        assert_eq!((unit * 3 - Money::from_cents(97)).cents(), 800);

        let mut running = Money::zero();
        running += unit;
        running -= Money::from_cents(99);
        assert_eq!(running.cents(), 200);
    }

    #[test]
    fn test_percentage_of_rounding() {
        assert_eq!(Money::from_cents(1000).percentage_of(1000).cents(), 100);
        // 82.5 → 83
        assert_eq!(Money::from_cents(1000).percentage_of(825).cents(), 83);
        // 299.85 → 300
        assert_eq!(Money::from_cents(1999).percentage_of(1500).cents(), 300);
        assert_eq!(Money::from_cents(4321).percentage_of(BPS_SCALE).cents(), 4321);
        assert_eq!(Money::from_cents(-1000).percentage_of(825).cents(), -83);
        assert_eq!(Money::from_cents(i64::MAX / 2).percentage_of(0), Money::zero());
    }

    #[test]
    fn test_clamp_and_min() {
        assert_eq!(Money::from_cents(-20).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(20).clamp_non_negative().cents(), 20);
        assert_eq!(Money::from_cents(700).min(Money::from_cents(500)).cents(), 500);
    }

    #[test]
    fn test_ratio_percent() {
        let part = Money::from_cents(250);
        assert!((part.ratio_percent(Money::from_cents(1000)) - 25.0).abs() < 1e-9);
        assert_eq!(part.ratio_percent(Money::zero()), 0.0);
    }

    #[test]
    fn test_sum_and_sign_checks() {
        let total: Money = [100, 250, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 355);
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_cents(-1).is_negative());
    }
}
