//! # Route Distance Index
//!
//! Answers "how far apart are station A and station B on this train's
//! route?".
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Build(train)                                                           │
//! │                                                                         │
//! │  active stops, by stop_order                                           │
//! │     KTW 0.00 ── AYA 71.08 ── SRB 113.00 ── NMA 264.10                   │
//! │                                                                         │
//! │  every pair i < j:                                                      │
//! │     both stops surveyed?  |d[j] − d[i]|                                 │
//! │     otherwise             |station[j] − station[i]| (fixed values)      │
//! │                                                                         │
//! │  → 6 rows, saved through the store, replacing the train's old rows     │
//! │                                                                         │
//! │  Get(train, A, B)                                                       │
//! │     cache A→B ─ hit ─► done                                             │
//! │     cache B→A ─ hit ─► reversed                                         │
//! │     miss ─► Build, search the fresh rows ─► found or NotFound           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::distance::Km;
use crate::error::{CoreError, CoreResult};
use crate::store::FareStore;
use crate::types::{RouteDistance, Station, StationId, Train, TrainId};

// =============================================================================
// Pure derivation
// =============================================================================

/// Derives every pairwise distance along `train`'s active stops.
///
/// `stations` supplies the fixed per-station distances used when a pair of
/// stops is not both surveyed. A pair whose stations lack those values too
/// is left out. Pairs joining a station to itself are skipped and the first
/// occurrence of a repeated station pair wins.
pub fn derive_route_distances(
    train: &Train,
    stations: &HashMap<StationId, Station>,
) -> Vec<RouteDistance> {
    let stops = train.active_stops();
    if stops.len() < 2 {
        return Vec::new();
    }

    let mut seen: HashSet<(StationId, StationId)> = HashSet::new();
    let mut distances = Vec::with_capacity(stops.len() * (stops.len() - 1) / 2);

    for (i, from) in stops.iter().enumerate() {
        for to in &stops[i + 1..] {
            if from.station_id == to.station_id {
                continue;
            }

            let key = ordered_pair(from.station_id, to.station_id);
            if seen.contains(&key) {
                continue;
            }

            let measured = match (from.distance_from_origin, to.distance_from_origin) {
                (Some(a), Some(b)) => {
                    let d = a.abs_diff(b);
                    Some((d, d))
                }
                _ => station_distance(stations, from.station_id, to.station_id),
            };

            if let Some((distance_km, distance_for_pricing)) = measured {
                seen.insert(key);
                distances.push(RouteDistance {
                    train_id: train.id,
                    from_station_id: from.station_id,
                    to_station_id: to.station_id,
                    distance_km,
                    distance_for_pricing,
                });
            }
        }
    }

    distances
}

fn ordered_pair(a: StationId, b: StationId) -> (StationId, StationId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Fixed-value fallback. When only one of the two fixed values exists on
/// both stations, it is used for both the actual and the pricing distance.
fn station_distance(
    stations: &HashMap<StationId, Station>,
    from: StationId,
    to: StationId,
) -> Option<(Km, Km)> {
    let a = stations.get(&from)?;
    let b = stations.get(&to)?;

    let actual = a
        .distance_actual
        .zip(b.distance_actual)
        .map(|(x, y)| x.abs_diff(y));
    let pricing = a
        .distance_for_pricing
        .zip(b.distance_for_pricing)
        .map(|(x, y)| x.abs_diff(y));

    match (actual, pricing) {
        (Some(actual), Some(pricing)) => Some((actual, pricing)),
        (Some(only), None) | (None, Some(only)) => Some((only, only)),
        (None, None) => None,
    }
}

// =============================================================================
// Index
// =============================================================================

/// How often [`RouteDistanceIndex::rebuild`] reloads a train whose stops
/// change underneath it.
pub const REBUILD_ATTEMPTS: u32 = 3;

/// Cached route distances with an on-the-fly rebuild on cache misses.
pub struct RouteDistanceIndex<'a, S> {
    store: &'a S,
}

impl<'a, S: FareStore> RouteDistanceIndex<'a, S> {
    pub fn new(store: &'a S) -> Self {
        RouteDistanceIndex { store }
    }

    /// Derives the full pairwise table for `train` and persists it.
    ///
    /// The rows are only cached while `train.stops_revision` is still the
    /// store's current revision; a train whose stops were edited in the
    /// meantime gets its rows derived but not written.
    ///
    /// ## Returns
    /// The derived rows. Empty for a train with fewer than two active stops.
    pub async fn build(&self, train: &Train) -> CoreResult<Vec<RouteDistance>> {
        Ok(self.derive_and_save(train).await?.0)
    }

    /// Loads a train and rebuilds its distances.
    ///
    /// A stop edit landing between the load and the write invalidates the
    /// rows just derived, so the train is reloaded and derived again, up to
    /// [`REBUILD_ATTEMPTS`] times.
    pub async fn rebuild(&self, train_id: TrainId) -> CoreResult<Vec<RouteDistance>> {
        let mut attempt = 1;
        loop {
            let train = self
                .store
                .train(train_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Train", train_id))?;

            let (distances, saved) = self.derive_and_save(&train).await?;
            if saved {
                return Ok(distances);
            }
            if attempt >= REBUILD_ATTEMPTS {
                // rows reflect the latest stop list seen, they are just not cached
                warn!(train_id, attempt, "Stops keep changing, route distances left uncached");
                return Ok(distances);
            }

            debug!(train_id, attempt, "Stops changed during rebuild, retrying");
            attempt += 1;
        }
    }

    async fn derive_and_save(&self, train: &Train) -> CoreResult<(Vec<RouteDistance>, bool)> {
        let mut stations = HashMap::new();
        for stop in train.active_stops() {
            if stations.contains_key(&stop.station_id) {
                continue;
            }
            if let Some(station) = self.store.station(stop.station_id).await? {
                stations.insert(station.id, station);
            }
        }

        let distances = derive_route_distances(train, &stations);
        let saved = self
            .store
            .save_route_distances(train.id, train.stops_revision, &distances)
            .await?;

        if saved {
            info!(
                train_id = train.id,
                stops_revision = train.stops_revision,
                pairs = distances.len(),
                "Route distances built"
            );
        }

        Ok((distances, saved))
    }

    /// Distance between `from` and `to` on the train's route, oriented
    /// `from → to`. Direction does not affect the distance.
    pub async fn get(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> CoreResult<RouteDistance> {
        if let Some(hit) = self.cached(train_id, from, to).await? {
            debug!(train_id, from, to, "Route distance cache hit");
            return Ok(hit);
        }

        debug!(train_id, from, to, "Route distance cache miss, rebuilding");

        let rebuilt = self.rebuild(train_id).await?;
        rebuilt
            .iter()
            .find(|d| d.connects(from, to))
            .map(|d| d.oriented(from))
            .ok_or_else(|| {
                CoreError::not_found("Route distance", format!("train {} {}→{}", train_id, from, to))
            })
    }

    async fn cached(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> CoreResult<Option<RouteDistance>> {
        if let Some(d) = self.store.cached_route_distance(train_id, from, to).await? {
            return Ok(Some(d));
        }
        Ok(self
            .store
            .cached_route_distance(train_id, to, from)
            .await?
            .map(|d| d.reversed()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
