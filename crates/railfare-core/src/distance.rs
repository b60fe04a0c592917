//! # Distance Module
//!
//! `Km` stores a distance in hundredths of a kilometre. Route distances are
//! rounded to two decimals when derived, and fare range bounds use the same
//! unit, so range overlap and lookup comparisons are plain integer
//! comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative distance in hundredths of a kilometre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Km(i64);

impl Km {
    /// Zero kilometres.
    pub const ZERO: Km = Km(0);

    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Km(hundredths)
    }

    /// Whole kilometres.
    #[inline]
    pub const fn from_whole(km: i64) -> Self {
        Km(km * 100)
    }

    /// Converts a floating-point kilometre value, rounding half away from
    /// zero to two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use railfare_core::distance::Km;
    ///
    /// assert_eq!(Km::from_f64(264.1).hundredths(), 26410);
    /// assert_eq!(Km::from_f64(71.125).hundredths(), 7113);
    /// ```
    pub fn from_f64(km: f64) -> Self {
        Km((km * 100.0).round() as i64)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Absolute difference between two positions along a line.
    #[inline]
    pub const fn abs_diff(self, other: Km) -> Km {
        Km((self.0 - other.0).abs())
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// `264.10 km`
impl fmt::Display for Km {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02} km", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Formats an optional upper bound, `∞` when absent.
pub fn display_upper(max: Option<Km>) -> String {
    match max {
        Some(km) => km.to_string(),
        None => "∞".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_rounds_to_two_decimals() {
        assert_eq!(Km::from_f64(0.0), Km::ZERO);
        assert_eq!(Km::from_f64(192.999), Km::from_hundredths(19300));
        assert_eq!(Km::from_f64(12.344), Km::from_hundredths(1234));
    }

    #[test]
    fn test_abs_diff_is_symmetric() {
        let a = Km::from_f64(71.08);
        let b = Km::from_f64(264.1);
        assert_eq!(a.abs_diff(b), b.abs_diff(a));
        assert_eq!(a.abs_diff(b), Km::from_hundredths(19302));
    }

    #[test]
    fn test_display() {
        assert_eq!(Km::from_hundredths(26410).to_string(), "264.10 km");
        assert_eq!(Km::from_whole(300).to_string(), "300.00 km");
        assert_eq!(display_upper(None), "∞");
        assert_eq!(display_upper(Some(Km::from_whole(5))), "5.00 km");
    }
}
