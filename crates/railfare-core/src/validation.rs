//! # Validation Module
//!
//! Input validation for fare range mutations and price requests.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (Rust)                                           │
//! │  ├── Range bounds: min_km >= 0, max_km > min_km                        │
//! │  └── Exactly one effective rate                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: FareStore (atomic)                                           │
//! │  └── Overlap scan + write in one unit                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on bounds and rate columns                      │
//! │  └── Triggers rejecting overlapping rows                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::distance::{display_upper, Km};
use crate::error::ValidationError;
use crate::fare_range::{FareRangeDraft, FareRate, NewFareRange};
use crate::types::StationId;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Fare Range Validators
// =============================================================================

/// Validates range bounds.
///
/// ## Rules
/// - `min_km` must be non-negative
/// - `max_km`, when present, must be strictly greater than `min_km`
pub fn validate_bounds(min_km: Km, max_km: Option<Km>) -> ValidationResult<()> {
    if min_km.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "min_km".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(max) = max_km {
        if max <= min_km {
            return Err(ValidationError::InvalidRange {
                min: min_km.to_string(),
                max: display_upper(max_km),
            });
        }
    }

    Ok(())
}

/// Picks the single effective rate out of the two optional rate fields.
///
/// ## Rules
/// - A per-km rate of zero counts as absent, so `per_km = 0, flat = 50`
///   is a flat ฿50 range
/// - A non-zero per-km rate together with a flat rate is ambiguous
/// - Neither present is an error
/// - Negative rates are rejected
pub fn resolve_rate(draft: &FareRangeDraft) -> ValidationResult<FareRate> {
    if let Some(rate) = draft.per_km_rate {
        if rate.ten_thousandths() < 0 {
            return Err(ValidationError::OutOfRange {
                field: "per_km_rate".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    if let Some(flat) = draft.flat_rate {
        if flat.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "flat_rate".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    let per_km = draft.per_km_rate.filter(|r| !r.is_zero());

    match (per_km, draft.flat_rate) {
        (Some(_), Some(_)) => Err(ValidationError::AmbiguousRate),
        (Some(rate), None) => Ok(FareRate::PerKm(rate)),
        (None, Some(amount)) => Ok(FareRate::Flat(amount)),
        (None, None) => Err(ValidationError::Required {
            field: "per_km_rate or flat_rate".to_string(),
        }),
    }
}

/// Validates a range definition and turns it into the form the store writes.
///
/// ## Example
/// ```rust
/// use railfare_core::distance::Km;
/// use railfare_core::fare_range::FareRangeDraft;
/// use railfare_core::money::Money;
/// use railfare_core::validation::validate_range_draft;
///
/// let draft = FareRangeDraft::flat(Km::ZERO, Some(Km::from_whole(300)), Money::from_baht(50));
/// assert!(validate_range_draft(&draft).is_ok());
///
/// let inverted = FareRangeDraft::flat(Km::from_whole(300), Some(Km::ZERO), Money::from_baht(50));
/// assert!(validate_range_draft(&inverted).is_err());
/// ```
pub fn validate_range_draft(draft: &FareRangeDraft) -> ValidationResult<NewFareRange> {
    validate_bounds(draft.min_km, draft.max_km)?;
    let rate = resolve_rate(draft)?;

    Ok(NewFareRange {
        min_km: draft.min_km,
        max_km: draft.max_km,
        rate,
    })
}

// =============================================================================
// Request Validators
// =============================================================================

/// Origin and destination must be different stations.
pub fn validate_journey(from: StationId, to: StationId) -> ValidationResult<()> {
    if from == to {
        return Err(ValidationError::InvalidFormat {
            field: "to_station_id".to_string(),
            reason: "destination must differ from origin".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Money, RatePerKm};

    fn draft(per_km: Option<i64>, flat: Option<i64>) -> FareRangeDraft {
        FareRangeDraft {
            min_km: Km::ZERO,
            max_km: Some(Km::from_whole(100)),
            per_km_rate: per_km.map(RatePerKm::from_ten_thousandths),
            flat_rate: flat.map(Money::from_satang),
        }
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(Km::ZERO, None).is_ok());
        assert!(validate_bounds(Km::ZERO, Some(Km::from_hundredths(1))).is_ok());

        assert!(validate_bounds(Km::from_whole(100), Some(Km::from_whole(100))).is_err());
        assert!(validate_bounds(Km::from_whole(100), Some(Km::from_whole(50))).is_err());
        assert!(validate_bounds(Km::from_hundredths(-1), None).is_err());
    }

    #[test]
    fn test_resolve_rate() {
        assert_eq!(
            resolve_rate(&draft(Some(3500), None)).unwrap(),
            FareRate::PerKm(RatePerKm::from_ten_thousandths(3500))
        );
        assert_eq!(
            resolve_rate(&draft(None, Some(5000))).unwrap(),
            FareRate::Flat(Money::from_baht(50))
        );
        // zero per-km rate falls through to the flat amount
        assert_eq!(
            resolve_rate(&draft(Some(0), Some(5000))).unwrap(),
            FareRate::Flat(Money::from_baht(50))
        );
        // a free range is allowed
        assert_eq!(
            resolve_rate(&draft(None, Some(0))).unwrap(),
            FareRate::Flat(Money::zero())
        );
    }

    #[test]
    fn test_resolve_rate_rejections() {
        assert!(matches!(
            resolve_rate(&draft(Some(3500), Some(5000))),
            Err(ValidationError::AmbiguousRate)
        ));
        assert!(matches!(
            resolve_rate(&draft(None, None)),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            resolve_rate(&draft(Some(0), None)),
            Err(ValidationError::Required { .. })
        ));
        assert!(resolve_rate(&draft(Some(-1), None)).is_err());
        assert!(resolve_rate(&draft(None, Some(-100))).is_err());
    }

    #[test]
    fn test_validate_journey() {
        assert!(validate_journey(1, 2).is_ok());
        assert!(validate_journey(5, 5).is_err());
    }
}
