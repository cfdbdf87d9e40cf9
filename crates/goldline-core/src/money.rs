//! # Money Module
//!
//! Provides the `Money` type for whole-rupee amounts.
//!
//! ## Why Whole Rupees?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE DRIFT PROBLEM                                                      │
//! │                                                                         │
//! │  Jewelry pricing multiplies decimal weights by decimal rates:          │
//! │    10.35 g × ₹6,870.0000001/g = ₹71,104.50000010...                     │
//! │                                                                         │
//! │  Repricing recomputes the same order again and again. If fractional    │
//! │  paise are carried, "is totalPaid >= totalAmount?" flickers.           │
//! │                                                                         │
//! │  OUR SOLUTION: Round once, store integers                              │
//! │    Every float result goes through Money::round() before it is         │
//! │    stored or compared. After that, all arithmetic is i64.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use goldline_core::money::Money;
//!
//! let metal = Money::round(10.0 * 6870.000000001);
//! assert_eq!(metal.rupees(), 68700);
//!
//! let total = metal + Money::from_rupees(4500);
//! assert_eq!(total.rupees(), 73200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole rupees.
///
/// ## Design Decisions
/// - **i64 (signed)**: balances can go negative transiently (overpayment)
/// - **No paise**: this domain never quotes fractions of a rupee
/// - **Single field tuple struct**: serializes as a bare JSON number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees)
    }

    /// Rounds a float result to the nearest whole rupee.
    ///
    /// This is the ONLY way a float enters the money domain. Halves round
    /// up (toward +∞). Non-finite inputs become zero.
    ///
    /// ## Example
    /// ```rust
    /// use goldline_core::money::Money;
    ///
    /// assert_eq!(Money::round(8244.0).rupees(), 8244);
    /// assert_eq!(Money::round(2443.32).rupees(), 2443);
    /// assert_eq!(Money::round(0.5).rupees(), 1);
    /// assert_eq!(Money::round(-0.5).rupees(), 0);
    /// assert_eq!(Money::round(f64::NAN).rupees(), 0);
    /// ```
    pub fn round(value: f64) -> Self {
        if !value.is_finite() {
            return Money::zero();
        }
        // `as` saturates at i64 bounds
        Money((value + 0.5).floor() as i64)
    }

    /// Returns the value in whole rupees.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0
    }

    /// Returns the value as f64 for multiplication by rates.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `self` or zero, whichever is larger.
    #[inline]
    pub fn floor_zero(self) -> Self {
        Money(self.0.max(0))
    }

    /// Applies a percentage (e.g. 12.0 = 12%) and rounds.
    ///
    /// ## Example
    /// ```rust
    /// use goldline_core::money::Money;
    ///
    /// let metal = Money::from_rupees(68700);
    /// assert_eq!(metal.percent(12.0).rupees(), 8244);
    /// ```
    pub fn percent(&self, pct: f64) -> Money {
        Money::round(self.as_f64() * pct / 100.0)
    }

    /// Calculates tax with half-up rounding.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 provides
    /// rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use goldline_core::money::Money;
    /// use goldline_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_rupees(81444);
    /// let tax = subtotal.calculate_tax(TaxRate::from_percentage(3.0));
    /// // ₹81,444 × 3% = ₹2,443.32 → ₹2,443
    /// assert_eq!(tax.rupees(), 2443);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 guards against overflow on large amounts
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000).div_euclid(10000);
        Money::from_rupees(tax as i64)
    }

    /// Splits `self` into `parts` installments.
    ///
    /// Every bucket gets `round(total / parts)` except the last, which takes
    /// whatever is left so the parts sum to `self` exactly. The remainder is
    /// never placed in an earlier bucket.
    ///
    /// ## Example
    /// ```rust
    /// use goldline_core::money::Money;
    ///
    /// let parts = Money::from_rupees(100).split_last_absorbs(3);
    /// let rupees: Vec<i64> = parts.iter().map(|m| m.rupees()).collect();
    /// assert_eq!(rupees, vec![33, 33, 34]);
    /// ```
    ///
    /// When rounding up would leave the last bucket negative (₹18 over 36
    /// parts rounds to ₹1 each), the earlier buckets use the floored share
    /// instead, so a non-negative total never yields a negative part:
    ///
    /// ```rust
    /// use goldline_core::money::Money;
    ///
    /// let parts = Money::from_rupees(18).split_last_absorbs(36);
    /// assert!(parts[..35].iter().all(|m| m.is_zero()));
    /// assert_eq!(parts[35].rupees(), 18);
    /// ```
    ///
    /// `parts == 0` returns an empty vector.
    pub fn split_last_absorbs(&self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let mut per_part = Money::round(self.as_f64() / parts as f64);
        if !self.is_negative() && per_part * (parts as i64 - 1) > *self {
            per_part = Money::from_rupees(self.rupees() / parts as i64);
        }
        let mut split = vec![per_part; parts];
        let last = *self - per_part * (parts as i64 - 1);
        split[parts - 1] = last;
        split
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money with Indian digit grouping: `₹1,23,456`.
///
/// ## Note
/// This is for logs and message templates. The frontend does its own
/// locale-aware formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let grouped = if digits.len() <= 3 {
            digits
        } else {
            let (head, tail) = digits.split_at(digits.len() - 3);
            let mut groups: Vec<&str> = Vec::new();
            let mut end = head.len();
            while end > 0 {
                let start = end.saturating_sub(2);
                groups.push(&head[start..end]);
                end = start;
            }
            groups.reverse();
            format!("{},{}", groups.join(","), tail)
        };

        write!(f, "{}₹{}", sign, grouped)
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
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
