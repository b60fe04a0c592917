//! # Money Module
//!
//! Provides the `Money` type for fares and the `RatePerKm` type for
//! distance-proportional tariffs.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    264.1 km × 0.35 ฿/km = 92.43499999999999  ❌                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer satang, integer hundredths of a km               │
//! │    26410 × 3500 / 10000 = 9243.5 → 9244 satang = ฿92.44                 │
//! │    Every component is a whole satang, so rounding each component and   │
//! │    each aggregate to 2 decimals is exact by construction.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use railfare_core::money::{Money, RatePerKm};
//! use railfare_core::distance::Km;
//!
//! let flat = Money::from_baht(50);
//! let per_km = RatePerKm::from_ten_thousandths(3500); // ฿0.35 per km
//! let fare = per_km.fare_for(Km::from_hundredths(26410));
//! assert_eq!(fare.satang(), 9244);
//! assert_eq!((flat + fare).to_string(), "฿142.44");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use crate::distance::Km;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in satang (1/100 baht).
///
/// ## Design Decisions
/// - **i64 (signed)**: adjustments may one day be negative (discounts)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as an integer**: the wire form is fixed-point with two
///   fraction digits, expressed in the minor unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from satang (the smallest currency unit).
    #[inline]
    pub const fn from_satang(satang: i64) -> Self {
        Money(satang)
    }

    /// Creates a Money value from whole baht.
    ///
    /// ## Example
    /// ```rust
    /// use railfare_core::money::Money;
    ///
    /// assert_eq!(Money::from_baht(150).satang(), 15000);
    /// ```
    #[inline]
    pub const fn from_baht(baht: i64) -> Self {
        Money(baht * 100)
    }

    /// Returns the value in satang.
    #[inline]
    pub const fn satang(&self) -> i64 {
        self.0
    }

    /// Returns the whole-baht portion.
    #[inline]
    pub const fn baht(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the satang portion (always 0-99).
    #[inline]
    pub const fn satang_part(&self) -> i64 {
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

    /// Formats the amount as a plain two-decimal number (`"200.00"`),
    /// without the currency sign.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.baht().abs(), self.satang_part())
    }
}

/// Display shows baht with the ฿ sign, e.g. `฿200.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}฿{}.{:02}", sign, self.baht().abs(), self.satang_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Rate Per Km
// =============================================================================

/// A per-kilometre tariff in ten-thousandths of a baht.
///
/// ## Why Ten-Thousandths?
/// Same idea as basis points: 3500 = ฿0.35/km. Tariff tables publish rates
/// with up to four decimals, so this keeps them exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatePerKm(i64);

impl RatePerKm {
    /// Creates a rate from ten-thousandths of a baht per km.
    #[inline]
    pub const fn from_ten_thousandths(value: i64) -> Self {
        RatePerKm(value)
    }

    /// Creates a rate from whole satang per km.
    #[inline]
    pub const fn from_satang(satang: i64) -> Self {
        RatePerKm(satang * 100)
    }

    /// Returns the raw value in ten-thousandths of a baht per km.
    #[inline]
    pub const fn ten_thousandths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Fare for travelling `distance` at this rate, rounded half-up to the
    /// satang.
    ///
    /// ## Implementation
    /// `hundredths_of_km × ten_thousandths / 10000` is already in satang;
    /// `+ 5000` before the division rounds half up, as `calculate_tax` does
    /// for basis points. i128 keeps long routes at high rates from
    /// overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use railfare_core::money::RatePerKm;
    /// use railfare_core::distance::Km;
    ///
    /// let rate = RatePerKm::from_ten_thousandths(2500); // ฿0.25/km
    /// // 100.02 km × 0.25 = 25.005 → ฿25.01
    /// assert_eq!(rate.fare_for(Km::from_hundredths(10002)).satang(), 2501);
    /// ```
    pub fn fare_for(&self, distance: Km) -> Money {
        let satang = (distance.hundredths() as i128 * self.0 as i128 + 5000) / 10000;
        Money::from_satang(satang as i64)
    }
}

impl fmt::Display for RatePerKm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "฿{}.{:04}/km", self.0 / 10000, (self.0 % 10000).abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
