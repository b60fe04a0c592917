//! # Route Distance Repository
//!
//! The persisted cache behind
//! [`RouteDistanceIndex`](railfare_core::RouteDistanceIndex). Rows are
//! stored in the orientation they were derived in; callers try both
//! orderings.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use railfare_core::{Km, RouteDistance, StationId, TrainId};

#[derive(Debug, sqlx::FromRow)]
struct RouteDistanceRow {
    train_id: i64,
    from_station_id: i64,
    to_station_id: i64,
    distance_km: i64,
    distance_for_pricing: i64,
}

impl From<RouteDistanceRow> for RouteDistance {
    fn from(row: RouteDistanceRow) -> Self {
        RouteDistance {
            train_id: row.train_id,
            from_station_id: row.from_station_id,
            to_station_id: row.to_station_id,
            distance_km: Km::from_hundredths(row.distance_km),
            distance_for_pricing: Km::from_hundredths(row.distance_for_pricing),
        }
    }
}

/// Repository for the route distance cache.
#[derive(Debug, Clone)]
pub struct RouteDistanceRepository {
    pool: SqlitePool,
}

impl RouteDistanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RouteDistanceRepository { pool }
    }

    /// The row stored exactly as `from → to`.
    pub async fn get(
        &self,
        train_id: TrainId,
        from: StationId,
        to: StationId,
    ) -> DbResult<Option<RouteDistance>> {
        let row = sqlx::query_as::<_, RouteDistanceRow>(
            r#"
            SELECT train_id, from_station_id, to_station_id, distance_km, distance_for_pricing
            FROM route_distances
            WHERE train_id = ?1 AND from_station_id = ?2 AND to_station_id = ?3
            "#,
        )
        .bind(train_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RouteDistance::from))
    }

    /// Replaces every cached row of the train in one transaction, provided
    /// the train is still at `stops_revision`.
    ///
    /// The revision check is the transaction's first statement and a write,
    /// so it takes the SQLite write lock: a stop edit either commits before
    /// it (the check fails) or waits until the rows are in (and its trigger
    /// then drops them).
    ///
    /// ## Returns
    /// `false`, with nothing written, when the stops changed since the rows
    /// were derived or the train no longer exists.
    pub async fn replace_for_train(
        &self,
        train_id: TrainId,
        stops_revision: i64,
        distances: &[RouteDistance],
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(
            "UPDATE trains SET stops_revision = stops_revision WHERE id = ?1 AND stops_revision = ?2",
        )
        .bind(train_id)
        .bind(stops_revision)
        .execute(&mut *tx)
        .await?;

        if current.rows_affected() == 0 {
            debug!(train_id, stops_revision, "Stops changed since derivation, not caching");
            return Ok(false);
        }

        debug!(train_id, stops_revision, rows = distances.len(), "Replacing route distances");

        sqlx::query("DELETE FROM route_distances WHERE train_id = ?1")
            .bind(train_id)
            .execute(&mut *tx)
            .await?;

        for d in distances {
            sqlx::query(
                r#"
                INSERT INTO route_distances
                    (train_id, from_station_id, to_station_id, distance_km, distance_for_pricing)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(train_id)
            .bind(d.from_station_id)
            .bind(d.to_station_id)
            .bind(d.distance_km.hundredths())
            .bind(d.distance_for_pricing.hundredths())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Number of cached rows for the train.
    pub async fn count_for_train(&self, train_id: TrainId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM route_distances WHERE train_id = ?1")
            .bind(train_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
