//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Invoice lines multiply fractional quantities (2.5 KW, 12.75 MTR)      │
//! │  by fractional rates and then take percentages twice. Integer cents    │
//! │  would force a rounding step inside every formula.                     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, full precision                          │
//! │    gross → discount → taxable → tax → total   (never rounded)          │
//! │    aggregate → round to 2 places              (rounded once)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let rate = Money::new(Decimal::new(10050, 2)); // 100.50
//! let gross = rate * Decimal::from(3);           // 301.50
//! assert_eq!(gross.to_string(), "301.50");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Number of decimal places money is rounded to for display and totals.
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount with full decimal precision.
///
/// ## Design Decisions
/// - **Decimal, not f64**: exact base-10 arithmetic
/// - **No implicit rounding**: arithmetic keeps every digit; call
///   [`Money::rounded`] at the output boundary
/// - **Transparent serde**: serialized as the inner decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal (full precision).
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to 2 decimal places, halves away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let tax = Money::new(Decimal::new(32405, 3)); // 32.405
    /// assert_eq!(tax.rounded().amount(), Decimal::new(3241, 2));
    /// ```
    pub fn rounded(&self) -> Money {
        let mut value = self
            .0
            .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(MONEY_SCALE);
        Money(value)
    }

    /// Returns `percent`% of this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let taxable = Money::new(Decimal::from(180));
    /// assert_eq!(taxable.percent(Decimal::from(18)).amount(), Decimal::new(324, 1));
    /// ```
    pub fn percent(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount rounded to 2 places without a currency symbol.
/// The renderer owns currency formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

/// Multiplication by a quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
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
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Money::new(dec!(212.4)).to_string(), "212.40");
        assert_eq!(Money::new(dec!(0)).to_string(), "0.00");
        assert_eq!(Money::new(dec!(10.999)).to_string(), "11.00");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).rounded().amount(), dec!(0.13));
        assert_eq!(Money::new(dec!(0.135)).rounded().amount(), dec!(0.14));
        assert_eq!(Money::new(dec!(-0.125)).rounded().amount(), dec!(-0.13));
    }

    #[test]
    fn test_arithmetic_keeps_precision() {
        let third = Money::new(dec!(1) / dec!(3));
        let back = third * dec!(3);
        // Decimal keeps 28 significant digits; the sum is within one ulp of 1
        assert_eq!(back.rounded().amount(), dec!(1.00));
    }

    #[test]
    fn test_percent() {
        let gross = Money::new(dec!(200));
        assert_eq!(gross.percent(dec!(10)).amount(), dec!(20));
        assert_eq!(gross.percent(dec!(0)).amount(), dec!(0));
    }

    #[test]
    fn test_sum() {
        let items = [Money::new(dec!(1.005)), Money::new(dec!(2.005))];
        let total: Money = items.iter().sum();
        assert_eq!(total.amount(), dec!(3.010));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::new(dec!(-1)).is_negative());
    }
}
