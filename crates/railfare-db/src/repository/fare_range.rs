//! # Fare Range Repository
//!
//! Storage for every fare category's ranges, keyed by scope.
//!
//! ## Atomic Range Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(scope, range)                       one transaction             │
//! │                                                                         │
//! │  1. UPSERT fare_scope_locks(scope)          ← takes the write lock;     │
//! │                                               other writers wait here   │
//! │  2. SELECT ranges of scope                                              │
//! │  3. find_overlap? ── yes ──► rollback, RangeOverlap { existing_id }     │
//! │         │ no                                                            │
//! │  4. INSERT fare_ranges                      ← overlap trigger re-checks │
//! │  5. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the lock row is written before the scan, two writers can never
//! both scan the pre-write state of a scope. The triggers also reject
//! overlapping rows written by anything that bypasses this repository.

use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use railfare_core::fare_range::find_overlap;
use railfare_core::{FareRange, FareRangeId, FareRate, Km, Money, NewFareRange, RatePerKm, ScopeKey};

#[derive(Debug, sqlx::FromRow)]
struct FareRangeRow {
    id: i64,
    scope_key: String,
    min_km: i64,
    max_km: Option<i64>,
    per_km_rate: Option<i64>,
    flat_rate: Option<i64>,
}

impl TryFrom<FareRangeRow> for FareRange {
    type Error = DbError;

    fn try_from(row: FareRangeRow) -> Result<Self, Self::Error> {
        let rate = match (row.per_km_rate, row.flat_rate) {
            (Some(rate), None) => FareRate::PerKm(RatePerKm::from_ten_thousandths(rate)),
            (None, Some(amount)) => FareRate::Flat(Money::from_satang(amount)),
            _ => {
                return Err(DbError::invalid_row(
                    "fare_ranges",
                    format!("range {} must have exactly one rate", row.id),
                ))
            }
        };

        Ok(FareRange {
            id: row.id,
            scope_key: ScopeKey::from_stored(row.scope_key),
            min_km: Km::from_hundredths(row.min_km),
            max_km: row.max_km.map(Km::from_hundredths),
            rate,
        })
    }
}

/// `(per_km_rate, flat_rate)` column values.
fn rate_columns(rate: &FareRate) -> (Option<i64>, Option<i64>) {
    match rate {
        FareRate::PerKm(rate) => (Some(rate.ten_thousandths()), None),
        FareRate::Flat(amount) => (None, Some(amount.satang())),
    }
}

const SELECT_RANGES: &str = r#"
    SELECT id, scope_key, min_km, max_km, per_km_rate, flat_rate
    FROM fare_ranges
"#;

async fn ranges_in(conn: &mut SqliteConnection, scope: &ScopeKey) -> DbResult<Vec<FareRange>> {
    let rows = sqlx::query_as::<_, FareRangeRow>(&format!(
        "{} WHERE scope_key = ?1 ORDER BY min_km, id",
        SELECT_RANGES
    ))
    .bind(scope.as_str())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(FareRange::try_from).collect()
}

/// Repository for fare ranges.
#[derive(Debug, Clone)]
pub struct FareRangeRepository {
    pool: SqlitePool,
}

impl FareRangeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FareRangeRepository { pool }
    }

    /// All ranges of a scope, ordered by `min_km`.
    pub async fn list(&self, scope: &ScopeKey) -> DbResult<Vec<FareRange>> {
        let mut conn = self.pool.acquire().await?;
        ranges_in(&mut conn, scope).await
    }

    pub async fn get(&self, id: FareRangeId) -> DbResult<Option<FareRange>> {
        let row = sqlx::query_as::<_, FareRangeRow>(&format!("{} WHERE id = ?1", SELECT_RANGES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FareRange::try_from).transpose()
    }

    /// Checks for overlap and inserts, atomically.
    ///
    /// ## Returns
    /// * `Ok(FareRange)` - the stored range with its id
    /// * `Err(DbError::RangeOverlap)` - the range overlaps one in its scope
    pub async fn insert(&self, scope: &ScopeKey, range: &NewFareRange) -> DbResult<FareRange> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO fare_scope_locks (scope_key, revision) VALUES (?1, 1)
            ON CONFLICT(scope_key) DO UPDATE SET revision = revision + 1
            "#,
        )
        .bind(scope.as_str())
        .execute(&mut *tx)
        .await?;

        let existing = ranges_in(&mut tx, scope).await?;
        if let Some(conflict) = find_overlap(&existing, range, None) {
            debug!(scope = %scope, existing_id = conflict.id, "Rejecting overlapping fare range");
            return Err(DbError::RangeOverlap {
                scope: scope.to_string(),
                existing_id: Some(conflict.id),
            });
        }

        let (per_km_rate, flat_rate) = rate_columns(&range.rate);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO fare_ranges (scope_key, min_km, max_km, per_km_rate, flat_rate)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(scope.as_str())
        .bind(range.min_km.hundredths())
        .bind(range.max_km.map(|m| m.hundredths()))
        .bind(per_km_rate)
        .bind(flat_rate)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).in_scope(scope.as_str()))?;

        tx.commit().await?;

        debug!(id, scope = %scope, "Fare range inserted");
        Ok(range.into_range(id, scope.clone()))
    }

    /// Re-checks overlap against the other ranges of the scope and
    /// overwrites range `id`, atomically.
    ///
    /// ## Returns
    /// * `Ok(Some(FareRange))` - the updated range
    /// * `Ok(None)` - no range with this id
    /// * `Err(DbError::RangeOverlap)` - the new bounds overlap a neighbour
    pub async fn update(&self, id: FareRangeId, range: &NewFareRange) -> DbResult<Option<FareRange>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            r#"
            INSERT INTO fare_scope_locks (scope_key, revision)
            SELECT scope_key, 1 FROM fare_ranges WHERE id = ?1
            ON CONFLICT(scope_key) DO UPDATE SET revision = revision + 1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if locked.rows_affected() == 0 {
            return Ok(None);
        }

        let scope: String = sqlx::query_scalar("SELECT scope_key FROM fare_ranges WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let scope = ScopeKey::from_stored(scope);

        let existing = ranges_in(&mut tx, &scope).await?;
        if let Some(conflict) = find_overlap(&existing, range, Some(id)) {
            debug!(id, scope = %scope, existing_id = conflict.id, "Rejecting overlapping fare range update");
            return Err(DbError::RangeOverlap {
                scope: scope.to_string(),
                existing_id: Some(conflict.id),
            });
        }

        let (per_km_rate, flat_rate) = rate_columns(&range.rate);
        sqlx::query(
            r#"
            UPDATE fare_ranges
            SET min_km = ?2,
                max_km = ?3,
                per_km_rate = ?4,
                flat_rate = ?5,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(range.min_km.hundredths())
        .bind(range.max_km.map(|m| m.hundredths()))
        .bind(per_km_rate)
        .bind(flat_rate)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).in_scope(scope.as_str()))?;

        tx.commit().await?;

        debug!(id, scope = %scope, "Fare range updated");
        Ok(Some(range.into_range(id, scope)))
    }

    /// Deletes a range. Returns whether a row was removed.
    pub async fn delete(&self, id: FareRangeId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM fare_ranges WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn km(whole: i64) -> Km {
        Km::from_whole(whole)
    }

    fn flat(min: i64, max: Option<i64>, baht: i64) -> NewFareRange {
        NewFareRange {
            min_km: km(min),
            max_km: max.map(km),
            rate: FareRate::Flat(Money::from_baht(baht)),
        }
    }

    fn class_two() -> ScopeKey {
        ScopeKey::from_stored("distance:class=2")
    }

    #[tokio::test]
    async fn test_insert_and_list_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ranges();

        let upper = repo.insert(&class_two(), &flat(300, None, 90)).await.unwrap();
        let per_km = NewFareRange {
            min_km: km(0),
            max_km: Some(km(300)),
            rate: FareRate::PerKm(RatePerKm::from_ten_thousandths(3500)),
        };
        let lower = repo.insert(&class_two(), &per_km).await.unwrap();

        let ranges = repo.list(&class_two()).await.unwrap();
        assert_eq!(ranges, vec![lower.clone(), upper.clone()]);
        assert_eq!(repo.get(upper.id).await.unwrap(), Some(upper));
    }

    #[tokio::test]
    async fn test_insert_overlap_reports_existing_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ranges();

        let first = repo.insert(&class_two(), &flat(0, Some(300), 50)).await.unwrap();
        repo.insert(&class_two(), &flat(300, Some(600), 90)).await.unwrap();

        match repo.insert(&class_two(), &flat(100, Some(200), 70)).await {
            Err(DbError::RangeOverlap { scope, existing_id }) => {
                assert_eq!(scope, "distance:class=2");
                assert_eq!(existing_id, Some(first.id));
            }
            other => panic!("expected overlap, got {:?}", other),
        }

        // another scope is unaffected
        let third = ScopeKey::from_stored("distance:class=3");
        assert!(repo.insert(&third, &flat(100, Some(200), 70)).await.is_ok());
        assert_eq!(repo.list(&class_two()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_rejects_overlap_written_around_repository() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.ranges().insert(&class_two(), &flat(0, Some(300), 50)).await.unwrap();

        let raw = sqlx::query(
            "INSERT INTO fare_ranges (scope_key, min_km, max_km, flat_rate) VALUES (?1, ?2, NULL, ?3)",
        )
        .bind("distance:class=2")
        .bind(km(299).hundredths())
        .bind(1000_i64)
        .execute(db.pool())
        .await
        .map_err(DbError::from);

        assert!(matches!(raw, Err(DbError::RangeOverlap { existing_id: None, .. })));

        // touching at the boundary is allowed by the trigger too
        let touching = sqlx::query(
            "INSERT INTO fare_ranges (scope_key, min_km, max_km, flat_rate) VALUES (?1, ?2, NULL, ?3)",
        )
        .bind("distance:class=2")
        .bind(km(300).hundredths())
        .bind(1000_i64)
        .execute(db.pool())
        .await;
        assert!(touching.is_ok());
    }

    #[tokio::test]
    async fn test_check_constraints_guard_rate_columns() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let both_rates = sqlx::query(
            "INSERT INTO fare_ranges (scope_key, min_km, per_km_rate, flat_rate) VALUES ('ac:bogie=1', 0, 3500, 5000)",
        )
        .execute(db.pool())
        .await
        .map_err(DbError::from);

        assert!(matches!(both_rates, Err(DbError::CheckViolation { .. })));
    }

    #[tokio::test]
    async fn test_update_excludes_self_and_rejects_neighbour() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ranges();

        let low = repo.insert(&class_two(), &flat(0, Some(300), 50)).await.unwrap();
        repo.insert(&class_two(), &flat(300, Some(600), 90)).await.unwrap();

        let repriced = repo.update(low.id, &flat(0, Some(300), 55)).await.unwrap().unwrap();
        assert_eq!(repriced.rate, FareRate::Flat(Money::from_baht(55)));

        let grown = repo.update(low.id, &flat(0, Some(301), 55)).await;
        assert!(matches!(grown, Err(DbError::RangeOverlap { existing_id: Some(_), .. })));

        assert_eq!(repo.update(4242, &flat(0, None, 1)).await.unwrap(), None);

        let stored = repo.get(low.id).await.unwrap().unwrap();
        assert_eq!(stored.max_km, Some(km(300)));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ranges();

        let r = repo.insert(&class_two(), &flat(0, None, 50)).await.unwrap();
        assert!(repo.delete(r.id).await.unwrap());
        assert!(!repo.delete(r.id).await.unwrap());
        assert!(repo.list(&class_two()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_inserts_admit_one() {
        let path = std::env::temp_dir().join(format!("railfare-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = db.ranges();
            handles.push(tokio::spawn(async move {
                repo.insert(&class_two(), &flat(i * 10, None, 50)).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(DbError::RangeOverlap { .. }) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(db.ranges().list(&class_two()).await.unwrap().len(), 1);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
