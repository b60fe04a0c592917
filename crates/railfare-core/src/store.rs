//! # Persistence Interface
//!
//! Everything the fare engine reads or writes goes through [`FareStore`].
//! The engine never holds a global connection: a store is passed into
//! [`PricingEngine::new`](crate::pricing::PricingEngine::new) and borrowed by
//! the index and the range tables.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FareStore                                                              │
//! │  ├── railfare_db::Database   SQLite via sqlx (production)              │
//! │  └── MemoryStore             HashMaps behind a RwLock (tests, demos)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomic Range Mutations
//! `insert_fare_range` and `update_fare_range` MUST run the overlap scan
//! ([`find_overlap`](crate::fare_range::find_overlap)) and the write as one
//! atomic unit with respect to other mutations of the same scope. Two
//! administrators inserting overlapping ranges concurrently must not both
//! succeed.

use std::future::Future;

use crate::error::StoreResult;
use crate::fare_range::{FareRange, NewFareRange};
use crate::scope::ScopeKey;
use crate::types::{
    Bogie, BogieId, FareRangeId, RouteDistance, Station, StationId, Train, TrainId, TrainType,
    TrainTypeId,
};

/// Persistence collaborator consumed by the fare engine.
pub trait FareStore: Send + Sync {
    /// Train with all of its stops (active and inactive).
    fn train(&self, id: TrainId) -> impl Future<Output = StoreResult<Option<Train>>> + Send;

    fn train_type(
        &self,
        id: TrainTypeId,
    ) -> impl Future<Output = StoreResult<Option<TrainType>>> + Send;

    fn station(&self, id: StationId) -> impl Future<Output = StoreResult<Option<Station>>> + Send;

    fn bogie(&self, id: BogieId) -> impl Future<Output = StoreResult<Option<Bogie>>> + Send;

    /// Whether the bogie is an active member of the train's composition.
    fn is_bogie_in_composition(
        &self,
        train_id: TrainId,
        bogie_id: BogieId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Cached distance stored exactly as `from → to`.
    fn cached_route_distance(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> impl Future<Output = StoreResult<Option<RouteDistance>>> + Send;

    /// Replaces every cached distance of the train with `distances`, which
    /// were derived from the stop list at `stops_revision`.
    ///
    /// The revision check and the write are one atomic unit. Returns `false`
    /// and writes nothing when the train's stops have changed since (or the
    /// train is gone), so a rebuild racing a stop edit never caches stale
    /// distances.
    fn save_route_distances(
        &self,
        train_id: TrainId,
        stops_revision: i64,
        distances: &[RouteDistance],
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// All ranges of a scope, ordered by `min_km`.
    fn fare_ranges(
        &self,
        scope: &ScopeKey,
    ) -> impl Future<Output = StoreResult<Vec<FareRange>>> + Send;

    fn fare_range(
        &self,
        id: FareRangeId,
    ) -> impl Future<Output = StoreResult<Option<FareRange>>> + Send;

    /// Atomically checks for overlap and inserts. Fails with
    /// `StoreError::Conflict` when the range overlaps one in the same scope.
    fn insert_fare_range(
        &self,
        scope: &ScopeKey,
        range: &NewFareRange,
    ) -> impl Future<Output = StoreResult<FareRange>> + Send;

    /// Atomically checks for overlap against the other ranges of the same
    /// scope and overwrites range `id`. Fails with `StoreError::NotFound`
    /// when the id is unknown.
    fn update_fare_range(
        &self,
        id: FareRangeId,
        range: &NewFareRange,
    ) -> impl Future<Output = StoreResult<FareRange>> + Send;

    /// Deletes a range; `false` when nothing was deleted.
    fn delete_fare_range(&self, id: FareRangeId) -> impl Future<Output = StoreResult<bool>> + Send;
}
