//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A sale line of 3 × Rp 33.333,33 drifts away from its unit price.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    quantity × unit_price is exact, so                                   │
//! │    TransactionItem.total_price == quantity × unit_price, always.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! For IDR the minor unit is the whole rupiah, so `Money::from_minor(25_000)`
//! is Rp 25.000.
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_minor(25_000);
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.minor(), 50_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and refunds can be negative
/// - **Newtype**: serializes as a plain JSON number, stored as INTEGER
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero.
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

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(25_000);
    /// assert_eq!(unit_price.multiply_quantity(2).minor(), 50_000);
    /// ```
    ///
    /// Saturates at the `i64` bounds; use [`Money::checked_mul_quantity`]
    /// where an overflow must be reported.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when the product overflows.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Rounded share of `total` that `self` represents, in whole percent.
    ///
    /// Returns 0 when `total` is zero. Rounds half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let part = Money::from_minor(15_000_000);
    /// let total = Money::from_minor(20_000_000);
    /// assert_eq!(part.percentage_of(total), 75);
    /// assert_eq!(part.percentage_of(Money::zero()), 0);
    /// ```
    pub fn percentage_of(&self, total: Money) -> i64 {
        if total.is_zero() {
            return 0;
        }
        (self.0 as f64 / total.0 as f64 * 100.0).round() as i64
    }

    /// Integer mean of `self` over `count`; zero when `count` is zero.
    pub fn average_over(&self, count: i64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money((self.0 as f64 / count as f64).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Rupiah formatting with dot thousands separators: `Rp 1.250.000`.
///
/// For logs only; clients format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
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
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(25_000).to_string(), "Rp 25.000");
        assert_eq!(Money::from_minor(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_minor(999).to_string(), "Rp 999");
        assert_eq!(Money::from_minor(-5_000).to_string(), "-Rp 5.000");
        assert_eq!(Money::zero().to_string(), "Rp 0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(10_000);
        let b = Money::from_minor(2_500);

        assert_eq!((a + b).minor(), 12_500);
        assert_eq!((a - b).minor(), 7_500);
        assert_eq!((a * 3).minor(), 30_000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.minor(), 15_000);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_minor(i64::MAX / 2 + 1);
        assert_eq!(huge.checked_mul_quantity(2), None);
        assert_eq!(huge.multiply_quantity(2).minor(), i64::MAX);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
    }

    #[test]
    fn test_line_total_is_exact() {
        let unit = Money::from_minor(33_333);
        assert_eq!(unit.multiply_quantity(3).minor(), 99_999);
    }

    #[test]
    fn test_percentage_of() {
        let total = Money::from_minor(20_000_000);
        assert_eq!(Money::from_minor(15_000_000).percentage_of(total), 75);
        assert_eq!(Money::from_minor(5_000_000).percentage_of(total), 25);
        // 1/3 rounds down, 2/3 rounds up
        let third = Money::from_minor(3);
        assert_eq!(Money::from_minor(1).percentage_of(third), 33);
        assert_eq!(Money::from_minor(2).percentage_of(third), 67);
    }

    #[test]
    fn test_average_over_zero_count() {
        assert_eq!(Money::from_minor(10_000).average_over(0), Money::zero());
        assert_eq!(Money::from_minor(10_000).average_over(4).minor(), 2_500);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_minor(50_000)).unwrap();
        assert_eq!(json, "50000");
    }
}
