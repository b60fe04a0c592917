//! # In-Memory Store
//!
//! A [`FareStore`] backed by hash maps, used by the unit tests and by
//! callers that price against a snapshot without a database.
//!
//! All state sits behind one `RwLock`. Range inserts and updates take the
//! write lock for the overlap scan and the write together, which is what
//! makes them atomic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::fare_range::{find_overlap, FareRange, NewFareRange};
use crate::scope::ScopeKey;
use crate::store::FareStore;
use crate::types::{
    Bogie, BogieId, FareRangeId, RouteDistance, Station, StationId, Train, TrainId, TrainType,
    TrainTypeId,
};

#[derive(Debug, Default)]
struct State {
    trains: HashMap<TrainId, Train>,
    train_types: HashMap<TrainTypeId, TrainType>,
    stations: HashMap<StationId, Station>,
    bogies: HashMap<BogieId, Bogie>,
    compositions: HashSet<(TrainId, BogieId)>,
    route_distances: HashMap<TrainId, Vec<RouteDistance>>,
    fare_ranges: BTreeMap<FareRangeId, FareRange>,
    next_range_id: FareRangeId,
}

impl State {
    fn ranges_in(&self, scope: &ScopeKey) -> Vec<FareRange> {
        let mut ranges: Vec<FareRange> = self
            .fare_ranges
            .values()
            .filter(|r| &r.scope_key == scope)
            .cloned()
            .collect();
        ranges.sort_by_key(|r| (r.min_km, r.id));
        ranges
    }
}

/// Hash-map backed [`FareStore`].
///
/// ## Usage
/// ```rust
/// use railfare_core::memory::MemoryStore;
/// use railfare_core::types::Station;
///
/// let store = MemoryStore::new();
/// store.put_station(Station {
///     id: 1,
///     code: "KTW".into(),
///     name: "Krung Thep Aphiwat".into(),
///     distance_actual: None,
///     distance_for_pricing: None,
/// });
/// assert_eq!(store.route_distance_count(1), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn with_state(&self, f: impl FnOnce(&mut State)) {
        // a poisoned lock only happens after a panic in another test thread
        if let Ok(mut state) = self.state.write() {
            f(&mut state);
        }
    }

    // =========================================================================
    // Fixture setup
    // =========================================================================

    pub fn put_station(&self, station: Station) {
        self.with_state(|s| {
            s.stations.insert(station.id, station);
        });
    }

    pub fn put_train_type(&self, train_type: TrainType) {
        self.with_state(|s| {
            s.train_types.insert(train_type.id, train_type);
        });
    }

    /// Adds or replaces a train. Replacing a train counts as a stop-list
    /// edit: the stop revision moves on and the cached distances are dropped.
    pub fn put_train(&self, mut train: Train) {
        self.with_state(|s| {
            train.stops_revision = s
                .trains
                .get(&train.id)
                .map_or(0, |previous| previous.stops_revision + 1);
            s.route_distances.remove(&train.id);
            s.trains.insert(train.id, train);
        });
    }

    pub fn put_bogie(&self, bogie: Bogie) {
        self.with_state(|s| {
            s.bogies.insert(bogie.id, bogie);
        });
    }

    /// Marks a bogie as an active member of a train's composition.
    pub fn attach_bogie(&self, train_id: TrainId, bogie_id: BogieId) {
        self.with_state(|s| {
            s.compositions.insert((train_id, bogie_id));
        });
    }

    pub fn detach_bogie(&self, train_id: TrainId, bogie_id: BogieId) {
        self.with_state(|s| {
            s.compositions.remove(&(train_id, bogie_id));
        });
    }

    /// Number of cached distance rows for a train.
    pub fn route_distance_count(&self, train_id: TrainId) -> usize {
        self.read()
            .map(|s| s.route_distances.get(&train_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl FareStore for MemoryStore {
    async fn train(&self, id: TrainId) -> StoreResult<Option<Train>> {
        Ok(self.read()?.trains.get(&id).cloned())
    }

    async fn train_type(&self, id: TrainTypeId) -> StoreResult<Option<TrainType>> {
        Ok(self.read()?.train_types.get(&id).cloned())
    }

    async fn station(&self, id: StationId) -> StoreResult<Option<Station>> {
        Ok(self.read()?.stations.get(&id).cloned())
    }

    async fn bogie(&self, id: BogieId) -> StoreResult<Option<Bogie>> {
        Ok(self.read()?.bogies.get(&id).cloned())
    }

    async fn is_bogie_in_composition(&self, train_id: TrainId, bogie_id: BogieId) -> StoreResult<bool> {
        Ok(self.read()?.compositions.contains(&(train_id, bogie_id)))
    }

    async fn cached_route_distance(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> StoreResult<Option<RouteDistance>> {
        let state = self.read()?;
        Ok(state.route_distances.get(&train_id).and_then(|rows| {
            rows.iter()
                .find(|d| d.from_station_id == from && d.to_station_id == to)
                .copied()
        }))
    }

    async fn save_route_distances(
        &self,
        train_id: TrainId,
        stops_revision: i64,
        distances: &[RouteDistance],
    ) -> StoreResult<bool> {
        let mut state = self.write()?;
        let current = state.trains.get(&train_id).map(|t| t.stops_revision);
        if current != Some(stops_revision) {
            return Ok(false);
        }
        state.route_distances.insert(train_id, distances.to_vec());
        Ok(true)
    }

    async fn fare_ranges(&self, scope: &ScopeKey) -> StoreResult<Vec<FareRange>> {
        Ok(self.read()?.ranges_in(scope))
    }

    async fn fare_range(&self, id: FareRangeId) -> StoreResult<Option<FareRange>> {
        Ok(self.read()?.fare_ranges.get(&id).cloned())
    }

    async fn insert_fare_range(
        &self,
        scope: &ScopeKey,
        range: &NewFareRange,
    ) -> StoreResult<FareRange> {
        let mut state = self.write()?;

        let existing = state.ranges_in(scope);
        if let Some(conflict) = find_overlap(&existing, range, None) {
            return Err(StoreError::Conflict {
                scope: scope.to_string(),
                existing_id: Some(conflict.id),
            });
        }

        state.next_range_id += 1;
        let stored = range.into_range(state.next_range_id, scope.clone());
        state.fare_ranges.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_fare_range(
        &self,
        id: FareRangeId,
        range: &NewFareRange,
    ) -> StoreResult<FareRange> {
        let mut state = self.write()?;

        let scope = state
            .fare_ranges
            .get(&id)
            .map(|r| r.scope_key.clone())
            .ok_or_else(|| StoreError::NotFound {
                entity: "Fare range",
                id: id.to_string(),
            })?;

        let existing = state.ranges_in(&scope);
        if let Some(conflict) = find_overlap(&existing, range, Some(id)) {
            return Err(StoreError::Conflict {
                scope: scope.to_string(),
                existing_id: Some(conflict.id),
            });
        }

        let stored = range.into_range(id, scope);
        state.fare_ranges.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_fare_range(&self, id: FareRangeId) -> StoreResult<bool> {
        Ok(self.write()?.fare_ranges.remove(&id).is_some())
    }
}
