//! # FareStore for Database
//!
//! Plugs the SQLite repositories into the fare engine. Each method is a thin
//! delegation; database errors become [`StoreError`]s on the way out.

use railfare_core::{
    Bogie, BogieId, FareRange, FareRangeId, FareStore, NewFareRange, RouteDistance, ScopeKey,
    Station, StationId, StoreError, StoreResult, Train, TrainId, TrainType, TrainTypeId,
};

use crate::pool::Database;

impl FareStore for Database {
    async fn train(&self, id: TrainId) -> StoreResult<Option<Train>> {
        Ok(self.trains().get(id).await?)
    }

    async fn train_type(&self, id: TrainTypeId) -> StoreResult<Option<TrainType>> {
        Ok(self.trains().get_type(id).await?)
    }

    async fn station(&self, id: StationId) -> StoreResult<Option<Station>> {
        Ok(self.stations().get(id).await?)
    }

    async fn bogie(&self, id: BogieId) -> StoreResult<Option<Bogie>> {
        Ok(self.bogies().get(id).await?)
    }

    async fn is_bogie_in_composition(&self, train_id: TrainId, bogie_id: BogieId) -> StoreResult<bool> {
        Ok(self.bogies().is_in_composition(train_id, bogie_id).await?)
    }

    async fn cached_route_distance(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> StoreResult<Option<RouteDistance>> {
        Ok(self.route_distances().get(train_id, from, to).await?)
    }

    async fn save_route_distances(
        &self,
        train_id: TrainId,
        stops_revision: i64,
        distances: &[RouteDistance],
    ) -> StoreResult<bool> {
        Ok(self
            .route_distances()
            .replace_for_train(train_id, stops_revision, distances)
            .await?)
    }

    async fn fare_ranges(&self, scope: &ScopeKey) -> StoreResult<Vec<FareRange>> {
        Ok(self.ranges().list(scope).await?)
    }

    async fn fare_range(&self, id: FareRangeId) -> StoreResult<Option<FareRange>> {
        Ok(self.ranges().get(id).await?)
    }

    async fn insert_fare_range(
        &self,
        scope: &ScopeKey,
        range: &NewFareRange,
    ) -> StoreResult<FareRange> {
        Ok(self.ranges().insert(scope, range).await?)
    }

    async fn update_fare_range(
        &self,
        id: FareRangeId,
        range: &NewFareRange,
    ) -> StoreResult<FareRange> {
        self.ranges()
            .update(id, range)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "Fare range",
                id: id.to_string(),
            })
    }

    async fn delete_fare_range(&self, id: FareRangeId) -> StoreResult<bool> {
        Ok(self.ranges().delete(id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
