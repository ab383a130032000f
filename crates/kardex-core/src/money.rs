//! # Money Module
//!
//! `Money` for lot and movement totals, `UnitCost` for per-unit cost.
//!
//! ## Why Two Types?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Totals are whole cents; unit costs are not.                            │
//! │                                                                         │
//! │  Lot: 3 units, total_cost $10.00 (1000 cents)                           │
//! │    unit cost = 1000 / 3 = 333.333... cents   ← UnitCost (Decimal)       │
//! │                                                                         │
//! │  Take 2 units:                                                          │
//! │    extend(2) = 666.666... → 667 cents        ← Money (i64)              │
//! │                                                                         │
//! │  Every stored total goes through UnitCost::extend, so every ledger row  │
//! │  is rounded the same way (round half to even).                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary total in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: Deltas applied to lots are signed
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - No multi-currency: every amount is in the ledger's one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::Money;
    ///
    /// let cost = Money::from_cents(1099); // $10.99
    /// assert_eq!(cost.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
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

    /// Returns the minor unit portion (always 0-99).
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the value as a decimal number of cents.
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sums amounts, `None` if any partial sum overflows.
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::Money;
    ///
    /// let total = Money::checked_sum([Money::from_cents(100), Money::from_cents(250)]);
    /// assert_eq!(total, Some(Money::from_cents(350)));
    /// assert_eq!(Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]), None);
    /// ```
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Cost
// =============================================================================

/// Cost of one unit, in cents, with decimal precision.
///
/// Serialized as a decimal string so no precision is lost on the wire or
/// in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct UnitCost(Decimal);

impl UnitCost {
    /// Unit cost of a batch: `total / quantity`.
    ///
    /// Returns `None` when `quantity` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::{Money, UnitCost};
    ///
    /// let unit = UnitCost::of(Money::from_cents(10000), 10).unwrap();
    /// assert_eq!(unit, UnitCost::from_cents(1000));
    /// assert!(UnitCost::of(Money::from_cents(100), 0).is_none());
    /// ```
    pub fn of(total: Money, quantity: i64) -> Option<Self> {
        if quantity == 0 {
            return None;
        }
        total
            .as_decimal()
            .checked_div(Decimal::from(quantity))
            .map(|d| UnitCost(d.normalize()))
    }

    /// Creates a unit cost from whole cents.
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        UnitCost(Decimal::from(cents))
    }

    /// Creates a unit cost from a decimal number of cents.
    #[inline]
    pub fn from_decimal(cents: Decimal) -> Self {
        UnitCost(cents.normalize())
    }

    /// Zero cost (free stock).
    #[inline]
    pub fn zero() -> Self {
        UnitCost(Decimal::ZERO)
    }

    /// Returns the cost in cents as a decimal.
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Checks if the cost is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Total cost of `quantity` units, rounded half to even to whole cents.
    ///
    /// Returns `None` when the total does not fit in a [`Money`].
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::UnitCost;
    ///
    /// let unit = UnitCost::from_cents(1200);
    /// assert_eq!(unit.extend(2).map(|m| m.cents()), Some(2400));
    /// assert!(UnitCost::from_cents(i64::MAX).extend(2).is_none());
    /// ```
    pub fn extend(&self, quantity: i64) -> Option<Money> {
        let exact = self.0.checked_mul(Decimal::from(quantity))?;
        let rounded = exact.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        rounded.to_i64().map(Money::from_cents)
    }
}

impl fmt::Display for UnitCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnitCost {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(UnitCost::from_decimal)
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
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total = Money::checked_sum([a, b, b]).unwrap();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = Money::from_cents(i64::MAX / 2 + 1);
        assert!(big.checked_add(big).is_none());
        assert!(Money::checked_sum([big, big]).is_none());
        assert!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)).is_none());
        assert_eq!(Money::checked_sum([]), Some(Money::zero()));
    }

    #[test]
    fn test_extend_overflow_is_none() {
        // 2 × 5e18 cents does not fit in i64
        let unit = UnitCost::from_cents(5_000_000_000_000_000_000);
        assert!(unit.extend(2).is_none());
        assert_eq!(unit.extend(1).map(|m| m.cents()), Some(5_000_000_000_000_000_000));
    }

    #[test]
    fn test_unit_cost_of_lot() {
        let unit = UnitCost::of(Money::from_cents(6000), 5).unwrap();
        assert_eq!(unit, UnitCost::from_cents(1200));

        assert!(UnitCost::of(Money::from_cents(6000), 0).is_none());
    }

    #[test]
    fn test_extend_rounds_half_to_even() {
        // 0.5 cent per unit
        let half = UnitCost::from_decimal(Decimal::new(5, 1));
        assert_eq!(half.extend(1).unwrap().cents(), 0); // 0.5 → 0
        assert_eq!(half.extend(3).unwrap().cents(), 2); // 1.5 → 2
        assert_eq!(half.extend(5).unwrap().cents(), 2); // 2.5 → 2
    }

    #[test]
    fn test_fractional_unit_cost_recovers_total() {
        let unit = UnitCost::of(Money::from_cents(1000), 3).unwrap();
        assert_eq!(unit.extend(3).unwrap().cents(), 1000);
        assert_eq!(unit.extend(1).unwrap().cents(), 333);
    }

    #[test]
    fn test_unit_cost_round_trips_through_text() {
        let unit = UnitCost::of(Money::from_cents(1000), 3).unwrap();
        let parsed: UnitCost = unit.to_string().parse().unwrap();
        assert_eq!(parsed, unit);
    }

    #[test]
    fn test_negative_check() {
        assert!(UnitCost::from_cents(-1).is_negative());
        assert!(!UnitCost::zero().is_negative());
        assert!(!UnitCost::from_cents(5).is_negative());
    }
}
