//! # Station Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use railfare_core::{Km, Station, StationId};

#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    id: i64,
    code: String,
    name: String,
    distance_actual: Option<i64>,
    distance_for_pricing: Option<i64>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            id: row.id,
            code: row.code,
            name: row.name,
            distance_actual: row.distance_actual.map(Km::from_hundredths),
            distance_for_pricing: row.distance_for_pricing.map(Km::from_hundredths),
        }
    }
}

/// Repository for station database operations.
#[derive(Debug, Clone)]
pub struct StationRepository {
    pool: SqlitePool,
}

impl StationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StationRepository { pool }
    }

    pub async fn get(&self, id: StationId) -> DbResult<Option<Station>> {
        let row = sqlx::query_as::<_, StationRow>(
            r#"
            SELECT id, code, name, distance_actual, distance_for_pricing
            FROM stations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Station::from))
    }

    /// Looks a station up by its code, e.g. `NMA`.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Station>> {
        let row = sqlx::query_as::<_, StationRow>(
            r#"
            SELECT id, code, name, distance_actual, distance_for_pricing
            FROM stations
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Station::from))
    }

    /// Inserts a station, or replaces the one with the same id.
    pub async fn upsert(&self, station: &Station) -> DbResult<()> {
        debug!(id = station.id, code = %station.code, "Upserting station");

        sqlx::query(
            r#"
            INSERT INTO stations (id, code, name, distance_actual, distance_for_pricing)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                name = excluded.name,
                distance_actual = excluded.distance_actual,
                distance_for_pricing = excluded.distance_for_pricing
            "#,
        )
        .bind(station.id)
        .bind(&station.code)
        .bind(&station.name)
        .bind(station.distance_actual.map(|d| d.hundredths()))
        .bind(station.distance_for_pricing.map(|d| d.hundredths()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts stations (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
