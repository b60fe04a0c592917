//! # Fare Range Tables
//!
//! A fare range table partitions the kilometre line into priced segments for
//! one scope and resolves a distance to the segment that applies.
//!
//! ## Interval Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ranges are half-open: [min_km, max_km), max_km absent = +∞            │
//! │                                                                         │
//! │   0 ─────────── 300 ─────────── 600 ─────────────────────────► ∞        │
//! │   [  range A    )[   range B    )[          range C                     │
//! │                                                                         │
//! │  Overlap:  minA < maxB_or_∞  AND  minB < maxA_or_∞                      │
//! │            → A and B touch at 300 and do NOT overlap                    │
//! │                                                                         │
//! │  Lookup(300):                                                           │
//! │    1. half-open match        → B                                        │
//! │    2. none? closed upper end → a range whose max_km == 300              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Table, Five Scopes
//! [`FareRangeTable`] is generic over the scope type, so the distance,
//! train-type, AC and berth tables all share the same validation, overlap
//! and lookup code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::distance::{display_upper, Km};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, RatePerKm};
use crate::scope::{FareScope, ScopeKey};
use crate::store::FareStore;
use crate::types::FareRangeId;
use crate::validation::validate_range_draft;

// =============================================================================
// Fare Rate
// =============================================================================

/// How a range prices a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FareRate {
    /// `distance × rate`
    PerKm(RatePerKm),
    /// A fixed amount regardless of distance within the range.
    Flat(Money),
}

impl FareRate {
    /// Evaluates the rate at `distance`, rounded to the satang.
    pub fn evaluate(&self, distance: Km) -> Money {
        match self {
            FareRate::PerKm(rate) => rate.fare_for(distance),
            FareRate::Flat(amount) => *amount,
        }
    }

    pub fn per_km_rate(&self) -> Option<RatePerKm> {
        match self {
            FareRate::PerKm(rate) => Some(*rate),
            FareRate::Flat(_) => None,
        }
    }

    pub fn flat_rate(&self) -> Option<Money> {
        match self {
            FareRate::PerKm(_) => None,
            FareRate::Flat(amount) => Some(*amount),
        }
    }
}

impl fmt::Display for FareRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FareRate::PerKm(rate) => write!(f, "{}", rate),
            FareRate::Flat(amount) => write!(f, "flat {}", amount),
        }
    }
}

// =============================================================================
// Fare Range
// =============================================================================

/// A persisted fare range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareRange {
    pub id: FareRangeId,
    pub scope_key: ScopeKey,
    pub min_km: Km,
    /// Exclusive upper bound; `None` is open-ended.
    pub max_km: Option<Km>,
    pub rate: FareRate,
}

impl FareRange {
    /// Half-open membership: `min_km <= distance < max_km`.
    pub fn contains(&self, distance: Km) -> bool {
        self.min_km <= distance && self.max_km.map_or(true, |max| distance < max)
    }

    pub fn fare_for(&self, distance: Km) -> Money {
        self.rate.evaluate(distance)
    }

    /// `[0.00 km, 300.00 km)`
    pub fn describe_bounds(&self) -> String {
        format!("[{}, {})", self.min_km, display_upper(self.max_km))
    }
}

/// A validated range ready to be written by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFareRange {
    pub min_km: Km,
    pub max_km: Option<Km>,
    pub rate: FareRate,
}

impl NewFareRange {
    /// Attaches an id and scope, producing the stored form.
    pub fn into_range(self, id: FareRangeId, scope_key: ScopeKey) -> FareRange {
        FareRange {
            id,
            scope_key,
            min_km: self.min_km,
            max_km: self.max_km,
            rate: self.rate,
        }
    }
}

/// An administrator's range definition, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FareRangeDraft {
    pub min_km: Km,
    #[serde(default)]
    pub max_km: Option<Km>,
    #[serde(default)]
    pub per_km_rate: Option<RatePerKm>,
    #[serde(default)]
    pub flat_rate: Option<Money>,
}

impl FareRangeDraft {
    pub fn flat(min_km: Km, max_km: Option<Km>, amount: Money) -> Self {
        FareRangeDraft {
            min_km,
            max_km,
            per_km_rate: None,
            flat_rate: Some(amount),
        }
    }

    pub fn per_km(min_km: Km, max_km: Option<Km>, rate: RatePerKm) -> Self {
        FareRangeDraft {
            min_km,
            max_km,
            per_km_rate: Some(rate),
            flat_rate: None,
        }
    }

    fn from_range(range: &FareRange) -> Self {
        FareRangeDraft {
            min_km: range.min_km,
            max_km: range.max_km,
            per_km_rate: range.rate.per_km_rate(),
            flat_rate: range.rate.flat_rate(),
        }
    }
}

/// A partial update to an existing range.
///
/// `None` leaves a field untouched. `max_km: Some(None)` makes the range
/// open-ended. Setting one rate kind without mentioning the other clears the
/// other, since a range has exactly one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FareRangePatch {
    pub min_km: Option<Km>,
    pub max_km: Option<Option<Km>>,
    pub per_km_rate: Option<Option<RatePerKm>>,
    pub flat_rate: Option<Option<Money>>,
}

impl FareRangePatch {
    /// Applies the patch on top of `range`.
    pub fn apply(&self, range: &FareRange) -> FareRangeDraft {
        let mut draft = FareRangeDraft::from_range(range);

        if let Some(min) = self.min_km {
            draft.min_km = min;
        }
        if let Some(max) = self.max_km {
            draft.max_km = max;
        }

        match (self.per_km_rate, self.flat_rate) {
            (Some(per_km), Some(flat)) => {
                draft.per_km_rate = per_km;
                draft.flat_rate = flat;
            }
            (Some(per_km), None) => {
                draft.per_km_rate = per_km;
                if per_km.is_some() {
                    draft.flat_rate = None;
                }
            }
            (None, Some(flat)) => {
                draft.flat_rate = flat;
                if flat.is_some() {
                    draft.per_km_rate = None;
                }
            }
            (None, None) => {}
        }

        draft
    }
}

// =============================================================================
// Overlap & Lookup (pure)
// =============================================================================

/// Half-open interval overlap. Ranges that only share a boundary point do
/// not overlap.
///
/// ## Example
/// ```rust
/// use railfare_core::distance::Km;
/// use railfare_core::fare_range::ranges_overlap;
///
/// let km = Km::from_whole;
/// assert!(!ranges_overlap(km(0), Some(km(100)), km(100), Some(km(200))));
/// assert!(ranges_overlap(km(0), Some(km(100)), km(99), Some(km(200))));
/// assert!(ranges_overlap(km(0), None, km(5000), None));
/// ```
pub fn ranges_overlap(a_min: Km, a_max: Option<Km>, b_min: Km, b_max: Option<Km>) -> bool {
    let a_starts_before_b_ends = b_max.map_or(true, |b_max| a_min < b_max);
    let b_starts_before_a_ends = a_max.map_or(true, |a_max| b_min < a_max);
    a_starts_before_b_ends && b_starts_before_a_ends
}

/// First range in `existing` that `candidate` would overlap, skipping the
/// range with id `exclude` (the one being updated).
///
/// Stores call this inside their atomic insert/update.
pub fn find_overlap<'r>(
    existing: &'r [FareRange],
    candidate: &NewFareRange,
    exclude: Option<FareRangeId>,
) -> Option<&'r FareRange> {
    existing
        .iter()
        .filter(|range| Some(range.id) != exclude)
        .find(|range| {
            ranges_overlap(range.min_km, range.max_km, candidate.min_km, candidate.max_km)
        })
}

/// Resolves the range that applies at `distance`.
///
/// ## Policy
/// 1. Ranges containing `distance` half-open (`min <= d < max`). Validated
///    tables have at most one; if older data holds several, the lowest
///    `min_km` wins, then the lowest id.
/// 2. When nothing contains it, a range whose upper bound equals `distance`
///    exactly, so the last bounded range of a table still prices a journey
///    ending on its limit.
pub fn resolve(ranges: &[FareRange], distance: Km) -> Option<&FareRange> {
    ranges
        .iter()
        .filter(|range| range.contains(distance))
        .min_by_key(|range| (range.min_km, range.id))
        .or_else(|| {
            ranges
                .iter()
                .filter(|range| range.max_km == Some(distance))
                .min_by_key(|range| (range.min_km, range.id))
        })
}

// =============================================================================
// Fare Range Table
// =============================================================================

/// Validated access to the fare ranges of one category.
///
/// ## Usage
/// ```rust,ignore
/// let table = FareRangeTable::<_, DistanceScope>::new(&store);
/// let scope = DistanceScope { class: ClassNumber::SECOND };
///
/// table.insert(&scope, &FareRangeDraft::flat(Km::ZERO, Some(Km::from_whole(300)), Money::from_baht(50))).await?;
/// let range = table.lookup(&scope, Km::from_f64(264.1)).await?;
/// ```
pub struct FareRangeTable<'a, S, K> {
    store: &'a S,
    _scope: PhantomData<fn(&K)>,
}

impl<'a, S, K> FareRangeTable<'a, S, K>
where
    S: FareStore,
    K: FareScope,
{
    pub fn new(store: &'a S) -> Self {
        FareRangeTable {
            store,
            _scope: PhantomData,
        }
    }

    /// Validates and inserts a range.
    ///
    /// ## Returns
    /// * `Ok(FareRange)` - the stored range with its id
    /// * `Err(CoreError::Validation)` - malformed bounds or rate
    /// * `Err(CoreError::RangeConflict)` - overlaps a range of the same scope
    pub async fn insert(&self, scope: &K, draft: &FareRangeDraft) -> CoreResult<FareRange> {
        let range = validate_range_draft(draft)?;
        let key = scope.scope_key();

        debug!(scope = %key, min = %range.min_km, max = %display_upper(range.max_km), "Inserting fare range");

        let stored = self.store.insert_fare_range(&key, &range).await?;
        Ok(stored)
    }

    /// Applies a partial update to range `id`.
    ///
    /// The merged range is re-validated and re-checked against every other
    /// range of its scope.
    pub async fn update(&self, id: FareRangeId, patch: &FareRangePatch) -> CoreResult<FareRange> {
        let current = self
            .store
            .fare_range(id)
            .await?
            .filter(|range| range.scope_key.is_in(K::CATEGORY))
            .ok_or_else(|| CoreError::not_found("Fare range", id))?;

        let range = validate_range_draft(&patch.apply(&current))?;

        debug!(id, scope = %current.scope_key, "Updating fare range");

        let stored = self.store.update_fare_range(id, &range).await?;
        Ok(stored)
    }

    /// Deletes range `id`. Returns whether a range was removed; ranges of
    /// another category are left alone and report `false`.
    pub async fn delete(&self, id: FareRangeId) -> CoreResult<bool> {
        let owned = self
            .store
            .fare_range(id)
            .await?
            .is_some_and(|range| range.scope_key.is_in(K::CATEGORY));
        if !owned {
            debug!(id, category = ?K::CATEGORY, "No fare range to delete in category");
            return Ok(false);
        }

        debug!(id, "Deleting fare range");
        Ok(self.store.delete_fare_range(id).await?)
    }

    /// All ranges of `scope`, ordered by `min_km`.
    pub async fn ranges(&self, scope: &K) -> CoreResult<Vec<FareRange>> {
        Ok(self.store.fare_ranges(&scope.scope_key()).await?)
    }

    /// The range that applies at `distance`, if any.
    pub async fn lookup(&self, scope: &K, distance: Km) -> CoreResult<Option<FareRange>> {
        let key = scope.scope_key();
        let ranges = self.store.fare_ranges(&key).await?;
        let found = resolve(&ranges, distance).cloned();

        debug!(
            scope = %key,
            distance = %distance,
            candidates = ranges.len(),
            matched = ?found.as_ref().map(|r| r.id),
            "Fare range lookup"
        );

        Ok(found)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::memory::MemoryStore;
    use crate::scope::{AcBogieScope, BerthScope, DistanceScope};
    use crate::types::{BerthType, ClassNumber};

    fn km(whole: i64) -> Km {
        Km::from_whole(whole)
    }

    fn range(id: FareRangeId, min: i64, max: Option<i64>, flat_baht: i64) -> FareRange {
        FareRange {
            id,
            scope_key: ScopeKey::from_stored("distance:class=2"),
            min_km: km(min),
            max_km: max.map(km),
            rate: FareRate::Flat(Money::from_baht(flat_baht)),
        }
    }

    const SECOND: DistanceScope = DistanceScope {
        class: ClassNumber::SECOND,
    };

    #[test]
    fn test_overlap_half_open() {
        // touching
        assert!(!ranges_overlap(km(0), Some(km(100)), km(100), Some(km(200))));
        assert!(!ranges_overlap(km(100), Some(km(200)), km(0), Some(km(100))));
        // one hundredth of a km of overlap
        assert!(ranges_overlap(
            km(0),
            Some(km(100)),
            Km::from_hundredths(9999),
            None
        ));
        // containment
        assert!(ranges_overlap(km(0), Some(km(500)), km(100), Some(km(200))));
        // open-ended vs anything starting later
        assert!(ranges_overlap(km(300), None, km(1000), Some(km(1200))));
        // open-ended vs range ending exactly at its start
        assert!(!ranges_overlap(km(300), None, km(0), Some(km(300))));
    }

    #[test]
    fn test_find_overlap_excludes_self() {
        let existing = vec![range(1, 0, Some(300), 50), range(2, 300, Some(600), 90)];
        let widened = NewFareRange {
            min_km: km(0),
            max_km: Some(km(350)),
            rate: FareRate::Flat(Money::from_baht(60)),
        };

        assert_eq!(find_overlap(&existing, &widened, None).map(|r| r.id), Some(1));
        assert_eq!(find_overlap(&existing, &widened, Some(1)).map(|r| r.id), Some(2));

        let shrunk = NewFareRange {
            max_km: Some(km(250)),
            ..widened
        };
        assert!(find_overlap(&existing, &shrunk, Some(1)).is_none());
    }

    #[test]
    fn test_resolve_boundary_goes_to_upper_range() {
        let ranges = vec![range(1, 0, Some(300), 50), range(2, 300, Some(600), 90)];

        assert_eq!(resolve(&ranges, km(300)).map(|r| r.id), Some(2));
        assert_eq!(resolve(&ranges, Km::from_hundredths(29999)).map(|r| r.id), Some(1));
        assert_eq!(resolve(&ranges, km(0)).map(|r| r.id), Some(1));
    }

    #[test]
    fn test_resolve_closed_end_fallback() {
        let ranges = vec![range(1, 0, Some(300), 50)];

        assert_eq!(resolve(&ranges, km(300)).map(|r| r.id), Some(1));
        assert!(resolve(&ranges, Km::from_hundredths(30001)).is_none());
    }

    #[test]
    fn test_resolve_tie_break_lowest_min_then_id() {
        // only reachable with rows written around the validator
        let ranges = vec![
            range(7, 100, Some(200), 10),
            range(3, 0, Some(500), 20),
            range(5, 0, None, 30),
        ];
        assert_eq!(resolve(&ranges, km(150)).map(|r| r.id), Some(3));
    }

    #[test]
    fn test_rate_evaluation() {
        let flat = FareRate::Flat(Money::from_baht(50));
        assert_eq!(flat.evaluate(Km::from_f64(264.1)), Money::from_baht(50));

        let per_km = FareRate::PerKm(RatePerKm::from_ten_thousandths(3500));
        assert_eq!(per_km.evaluate(Km::from_f64(264.1)).satang(), 9244);
    }

    #[test]
    fn test_patch_switches_rate_kind() {
        let current = range(1, 0, Some(300), 50);
        let patch = FareRangePatch {
            per_km_rate: Some(Some(RatePerKm::from_satang(30))),
            max_km: Some(None),
            ..FareRangePatch::default()
        };

        let merged = patch.apply(&current);
        assert_eq!(merged.flat_rate, None);
        assert_eq!(merged.per_km_rate, Some(RatePerKm::from_satang(30)));
        assert_eq!(merged.max_km, None);
        assert_eq!(merged.min_km, km(0));
    }

    #[tokio::test]
    async fn test_insert_rejects_overlap_and_accepts_touching() {
        let store = MemoryStore::new();
        let table = FareRangeTable::<_, DistanceScope>::new(&store);

        let first = table
            .insert(&SECOND, &FareRangeDraft::flat(km(0), Some(km(300)), Money::from_baht(50)))
            .await
            .unwrap();

        let touching = table
            .insert(&SECOND, &FareRangeDraft::flat(km(300), Some(km(600)), Money::from_baht(90)))
            .await;
        assert!(touching.is_ok());

        let overlapping = table
            .insert(&SECOND, &FareRangeDraft::flat(km(250), None, Money::from_baht(70)))
            .await;
        match overlapping {
            Err(CoreError::RangeConflict { scope, existing_id }) => {
                assert_eq!(scope, "distance:class=2");
                assert_eq!(existing_id, Some(first.id));
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        // nothing was written by the rejected insert
        assert_eq!(table.ranges(&SECOND).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let store = MemoryStore::new();
        let distance = FareRangeTable::<_, DistanceScope>::new(&store);
        let ac = FareRangeTable::<_, AcBogieScope>::new(&store);

        distance
            .insert(&SECOND, &FareRangeDraft::flat(km(0), None, Money::from_baht(50)))
            .await
            .unwrap();
        ac.insert(
            &AcBogieScope { bogie_id: 17 },
            &FareRangeDraft::flat(km(0), None, Money::from_baht(80)),
        )
        .await
        .unwrap();

        let third = DistanceScope {
            class: ClassNumber::THIRD,
        };
        distance
            .insert(&third, &FareRangeDraft::flat(km(0), None, Money::from_baht(20)))
            .await
            .unwrap();

        let hit = distance.lookup(&third, km(10)).await.unwrap().unwrap();
        assert_eq!(hit.rate, FareRate::Flat(Money::from_baht(20)));
    }

    #[tokio::test]
    async fn test_insert_validation_errors() {
        let store = MemoryStore::new();
        let table = FareRangeTable::<_, BerthScope>::new(&store);
        let scope = BerthScope {
            bogie_id: 3,
            berth: BerthType::Lower,
        };

        let inverted = FareRangeDraft::flat(km(500), Some(km(0)), Money::from_baht(100));
        assert!(matches!(
            table.insert(&scope, &inverted).await,
            Err(CoreError::Validation(ValidationError::InvalidRange { .. }))
        ));

        let no_rate = FareRangeDraft {
            min_km: km(0),
            ..FareRangeDraft::default()
        };
        assert!(matches!(
            table.insert(&scope, &no_rate).await,
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_rechecks_other_ranges() {
        let store = MemoryStore::new();
        let table = FareRangeTable::<_, DistanceScope>::new(&store);

        let low = table
            .insert(&SECOND, &FareRangeDraft::flat(km(0), Some(km(300)), Money::from_baht(50)))
            .await
            .unwrap();
        table
            .insert(&SECOND, &FareRangeDraft::flat(km(300), Some(km(600)), Money::from_baht(90)))
            .await
            .unwrap();

        // self is excluded: changing only the rate is fine
        let repriced = table
            .update(
                low.id,
                &FareRangePatch {
                    flat_rate: Some(Some(Money::from_baht(55))),
                    ..FareRangePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(repriced.rate, FareRate::Flat(Money::from_baht(55)));

        // growing into the neighbour is not
        let grown = table
            .update(
                low.id,
                &FareRangePatch {
                    max_km: Some(Some(km(301))),
                    ..FareRangePatch::default()
                },
            )
            .await;
        assert!(matches!(grown, Err(CoreError::RangeConflict { .. })));

        // the failed update left the stored range untouched
        let stored = table.ranges(&SECOND).await.unwrap();
        assert_eq!(stored[0].max_km, Some(km(300)));
        assert_eq!(stored[0].rate, FareRate::Flat(Money::from_baht(55)));
    }

    #[tokio::test]
    async fn test_update_unknown_or_foreign_range_is_not_found() {
        let store = MemoryStore::new();
        let distance = FareRangeTable::<_, DistanceScope>::new(&store);
        let ac = FareRangeTable::<_, AcBogieScope>::new(&store);

        assert!(matches!(
            distance.update(42, &FareRangePatch::default()).await,
            Err(CoreError::NotFound { .. })
        ));

        let ac_range = ac
            .insert(
                &AcBogieScope { bogie_id: 1 },
                &FareRangeDraft::flat(km(0), None, Money::from_baht(80)),
            )
            .await
            .unwrap();
        assert!(matches!(
            distance.update(ac_range.id, &FareRangePatch::default()).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let table = FareRangeTable::<_, DistanceScope>::new(&store);

        let r = table
            .insert(&SECOND, &FareRangeDraft::flat(km(0), None, Money::from_baht(50)))
            .await
            .unwrap();

        assert!(table.delete(r.id).await.unwrap());
        assert!(!table.delete(r.id).await.unwrap());
        assert!(table.lookup(&SECOND, km(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_leaves_other_categories_alone() {
        let store = MemoryStore::new();
        let distance = FareRangeTable::<_, DistanceScope>::new(&store);
        let ac = FareRangeTable::<_, AcBogieScope>::new(&store);
        let bogie = AcBogieScope { bogie_id: 1 };

        let ac_range = ac
            .insert(&bogie, &FareRangeDraft::flat(km(0), None, Money::from_baht(80)))
            .await
            .unwrap();

        assert!(!distance.delete(ac_range.id).await.unwrap());
        assert_eq!(ac.lookup(&bogie, km(10)).await.unwrap(), Some(ac_range.clone()));

        assert!(ac.delete(ac_range.id).await.unwrap());
        assert!(ac.lookup(&bogie, km(10)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_inserts_admit_one() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let table = FareRangeTable::<_, DistanceScope>::new(store.as_ref());
                let draft = FareRangeDraft::flat(km(i * 10), None, Money::from_baht(50));
                table.insert(&SECOND, &draft).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(store.fare_ranges(&SECOND.scope_key()).await.unwrap().len(), 1);
    }
}
