//! # Train Repository
//!
//! Trains with their stop lists, and train types.
//!
//! Writing a train replaces its stop list. The `train_stops` triggers bump
//! the train's `stops_revision` and drop its cached route distances on any
//! stop change, so the next distance lookup rebuilds them. The revision
//! passed in on upsert is ignored; only the triggers move it.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use railfare_core::{Km, Money, Stop, Train, TrainId, TrainType, TrainTypeId};

#[derive(Debug, sqlx::FromRow)]
struct TrainRow {
    id: i64,
    number: String,
    name: String,
    train_type_id: i64,
    stops_revision: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StopRow {
    station_id: i64,
    stop_order: i32,
    distance_from_origin: Option<i64>,
    is_active: bool,
}

impl From<StopRow> for Stop {
    fn from(row: StopRow) -> Self {
        Stop {
            station_id: row.station_id,
            stop_order: row.stop_order,
            distance_from_origin: row.distance_from_origin.map(Km::from_hundredths),
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrainTypeRow {
    id: i64,
    code: String,
    name: String,
    base_fare: Option<i64>,
}

impl From<TrainTypeRow> for TrainType {
    fn from(row: TrainTypeRow) -> Self {
        TrainType {
            id: row.id,
            code: row.code,
            name: row.name,
            base_fare: row.base_fare.map(Money::from_satang),
        }
    }
}

/// Repository for trains, stops and train types.
#[derive(Debug, Clone)]
pub struct TrainRepository {
    pool: SqlitePool,
}

impl TrainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TrainRepository { pool }
    }

    /// Gets a train with all of its stops, active or not.
    ///
    /// The train row and its stops are read in one transaction, so
    /// `stops_revision` always matches the stop list returned.
    pub async fn get(&self, id: TrainId) -> DbResult<Option<Train>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TrainRow>(
            "SELECT id, number, name, train_type_id, stops_revision FROM trains WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stops = sqlx::query_as::<_, StopRow>(
            r#"
            SELECT station_id, stop_order, distance_from_origin, is_active
            FROM train_stops
            WHERE train_id = ?1
            ORDER BY stop_order
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Train {
            id: row.id,
            number: row.number,
            name: row.name,
            train_type_id: row.train_type_id,
            stops: stops.into_iter().map(Stop::from).collect(),
            stops_revision: row.stops_revision,
        }))
    }

    /// Inserts or replaces a train together with its full stop list.
    pub async fn upsert(&self, train: &Train) -> DbResult<()> {
        debug!(id = train.id, number = %train.number, stops = train.stops.len(), "Upserting train");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trains (id, number, name, train_type_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                number = excluded.number,
                name = excluded.name,
                train_type_id = excluded.train_type_id
            "#,
        )
        .bind(train.id)
        .bind(&train.number)
        .bind(&train.name)
        .bind(train.train_type_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM train_stops WHERE train_id = ?1")
            .bind(train.id)
            .execute(&mut *tx)
            .await?;

        for stop in &train.stops {
            sqlx::query(
                r#"
                INSERT INTO train_stops (train_id, station_id, stop_order, distance_from_origin, is_active)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(train.id)
            .bind(stop.station_id)
            .bind(stop.stop_order)
            .bind(stop.distance_from_origin.map(|d| d.hundredths()))
            .bind(stop.is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_type(&self, id: TrainTypeId) -> DbResult<Option<TrainType>> {
        let row = sqlx::query_as::<_, TrainTypeRow>(
            "SELECT id, code, name, base_fare FROM train_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TrainType::from))
    }

    pub async fn upsert_type(&self, train_type: &TrainType) -> DbResult<()> {
        debug!(id = train_type.id, code = %train_type.code, "Upserting train type");

        sqlx::query(
            r#"
            INSERT INTO train_types (id, code, name, base_fare)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                name = excluded.name,
                base_fare = excluded.base_fare
            "#,
        )
        .bind(train_type.id)
        .bind(&train_type.code)
        .bind(&train_type.name)
        .bind(train_type.base_fare.map(|m| m.satang()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
