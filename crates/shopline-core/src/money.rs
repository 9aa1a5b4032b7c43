//! # Money Module
//!
//! Provides the `Money` type for monetary values and `DiscountRate` for
//! percentage discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    9.99 * 2 * 0.10 = 1.9980000000000002  ❌                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1998 cents * 1000 bps → 199.8 cents → rounds to 200 cents           │
//! │    Every sale row satisfies total == unit*qty - discount exactly       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopline_core::money::{DiscountRate, Money};
//!
//! let price = Money::from_cents(999); // $9.99
//! let subtotal = price.checked_multiply_quantity(2).unwrap(); // $19.98
//! let discount = subtotal.discount_amount(DiscountRate::from_percent(10));
//! assert_eq!(discount.cents(), 200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Single currency**: Shopline does not do multi-currency
/// - **Checked scaling**: quantities and running totals go through
///   [`Money::checked_multiply_quantity`] and [`Money::checked_add`]; the
///   `+`/`-` operators are for amounts already known to be in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use shopline_core::money::Money;
    ///
    /// let price = Money::from_major_minor(9, 99);
    /// assert_eq!(price.cents(), 999);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns the value in major units as a float.
    ///
    /// For JSON display fields only. Never feed the result back into
    /// arithmetic.
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shopline_core::money::Money;
    ///
    /// let line_total = Money::from_cents(999).checked_multiply_quantity(2);
    /// assert_eq!(line_total, Some(Money::from_cents(1998)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns the discount owed on this amount at the given rate.
    ///
    /// ## Rounding
    /// Half-up on the absolute value, to the cent:
    /// `(|amount| * bps + 5000) / 10000`, sign restored afterwards.
    ///
    /// ```text
    /// $19.98 at 10%  → 199.8 cents → 200 cents
    /// $10.10 at 5%   →  50.5 cents →  51 cents
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        // i128 keeps large totals from overflowing during the multiply
        let magnitude = (self.0.unsigned_abs() as i128 * rate.bps() as i128 + 5000) / 10000;
        let magnitude = magnitude as i64;
        if self.0 < 0 {
            Money(-magnitude)
        } else {
            Money(magnitude)
        }
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use shopline_core::money::{DiscountRate, Money};
    ///
    /// let subtotal = Money::from_cents(10000);
    /// let discounted = subtotal.apply_discount(DiscountRate::from_percent(20));
    /// assert_eq!(discounted.cents(), 8000);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }
}

/// Display implementation shows money in a human-readable format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (Silver tier)
///
/// Percentages coming from clients (e.g. `tierDiscount: 12.5`) are converted
/// once at the edge with [`DiscountRate::from_percentage`] and validated
/// with [`crate::validation::validate_discount_rate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% expressed in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    /// Creates a discount rate from a (possibly fractional) percentage.
    ///
    /// Negative or non-finite inputs collapse to zero; callers validate the
    /// range before using the rate.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return DiscountRate(0);
        }
        DiscountRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1798)), "$17.98");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_multiply_quantity(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let huge = Money::from_cents(i64::MAX / 100);
        assert_eq!(huge.checked_multiply_quantity(500), None);
        assert_eq!(huge.checked_multiply_quantity(100), Some(Money::from_cents(i64::MAX / 100 * 100)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_discount_rounds_half_up_to_the_cent() {
        // 199.8 cents → 200
        let subtotal = Money::from_cents(1998);
        assert_eq!(subtotal.discount_amount(DiscountRate::from_percent(10)).cents(), 200);

        // 50.5 cents → 51
        let subtotal = Money::from_cents(1010);
        assert_eq!(subtotal.discount_amount(DiscountRate::from_percent(5)).cents(), 51);

        // 50.45 cents → 50
        let subtotal = Money::from_cents(1009);
        assert_eq!(subtotal.discount_amount(DiscountRate::from_percent(5)).cents(), 50);
    }

    #[test]
    fn test_zero_rate_gives_zero_discount() {
        let subtotal = Money::from_cents(12345);
        assert!(subtotal.discount_amount(DiscountRate::zero()).is_zero());
        assert_eq!(subtotal.apply_discount(DiscountRate::zero()), subtotal);
    }

    #[test]
    fn test_full_rate_discounts_everything() {
        let subtotal = Money::from_cents(12345);
        let rate = DiscountRate::from_bps(DiscountRate::MAX_BPS);
        assert_eq!(subtotal.discount_amount(rate), subtotal);
        assert!(subtotal.apply_discount(rate).is_zero());
    }

    #[test]
    fn test_discount_rate_from_percentage() {
        assert_eq!(DiscountRate::from_percentage(12.5).bps(), 1250);
        assert_eq!(DiscountRate::from_percentage(10.0), DiscountRate::from_percent(10));
        assert_eq!(DiscountRate::from_percentage(-3.0).bps(), 0);
        assert_eq!(DiscountRate::from_percentage(f64::NAN).bps(), 0);
        assert!((DiscountRate::from_bps(1500).percentage() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_major_f64() {
        assert!((Money::from_cents(999).to_major_f64() - 9.99).abs() < 1e-9);
    }
}
