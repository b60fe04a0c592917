//! # Bogie Repository
//!
//! Bogies, the AC fare categories they may belong to, and the composition
//! table saying which bogies run on which train.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use railfare_core::{AcCategoryId, BerthLayout, Bogie, BogieId, ClassNumber, TrainId};

#[derive(Debug, sqlx::FromRow)]
struct BogieRow {
    id: i64,
    code: String,
    class_number: i64,
    has_ac: bool,
    is_sleeper: bool,
    upper_berths: i64,
    lower_berths: i64,
    single_berths: i64,
    ac_fare_category_id: Option<i64>,
}

impl TryFrom<BogieRow> for Bogie {
    type Error = DbError;

    fn try_from(row: BogieRow) -> Result<Self, Self::Error> {
        let berth_count = |n: i64| u16::try_from(n).map_err(|e| DbError::invalid_row("bogies", e));

        Ok(Bogie {
            id: row.id,
            code: row.code,
            class_number: ClassNumber::try_from(row.class_number)
                .map_err(|e| DbError::invalid_row("bogies", e))?,
            has_ac: row.has_ac,
            is_sleeper: row.is_sleeper,
            berths: BerthLayout {
                upper: berth_count(row.upper_berths)?,
                lower: berth_count(row.lower_berths)?,
                single: berth_count(row.single_berths)?,
            },
            ac_fare_category_id: row.ac_fare_category_id,
        })
    }
}

/// Repository for bogies and compositions.
#[derive(Debug, Clone)]
pub struct BogieRepository {
    pool: SqlitePool,
}

impl BogieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BogieRepository { pool }
    }

    pub async fn get(&self, id: BogieId) -> DbResult<Option<Bogie>> {
        let row = sqlx::query_as::<_, BogieRow>(
            r#"
            SELECT id, code, class_number, has_ac, is_sleeper,
                   upper_berths, lower_berths, single_berths, ac_fare_category_id
            FROM bogies
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Bogie::try_from).transpose()
    }

    pub async fn upsert(&self, bogie: &Bogie) -> DbResult<()> {
        debug!(id = bogie.id, code = %bogie.code, "Upserting bogie");

        sqlx::query(
            r#"
            INSERT INTO bogies (
                id, code, class_number, has_ac, is_sleeper,
                upper_berths, lower_berths, single_berths, ac_fare_category_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                class_number = excluded.class_number,
                has_ac = excluded.has_ac,
                is_sleeper = excluded.is_sleeper,
                upper_berths = excluded.upper_berths,
                lower_berths = excluded.lower_berths,
                single_berths = excluded.single_berths,
                ac_fare_category_id = excluded.ac_fare_category_id
            "#,
        )
        .bind(bogie.id)
        .bind(&bogie.code)
        .bind(i64::from(bogie.class_number.get()))
        .bind(bogie.has_ac)
        .bind(bogie.is_sleeper)
        .bind(i64::from(bogie.berths.upper))
        .bind(i64::from(bogie.berths.lower))
        .bind(i64::from(bogie.berths.single))
        .bind(bogie.ac_fare_category_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_ac_category(&self, id: AcCategoryId, code: &str, name: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ac_fare_categories (id, code, name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET code = excluded.code, name = excluded.name
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether the bogie is an active member of the train's composition.
    pub async fn is_in_composition(&self, train_id: TrainId, bogie_id: BogieId) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM train_compositions
            WHERE train_id = ?1 AND bogie_id = ?2 AND is_active = 1
            "#,
        )
        .bind(train_id)
        .bind(bogie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    /// Adds the bogie to the train's composition, or reactivates it.
    pub async fn attach(&self, train_id: TrainId, bogie_id: BogieId, position: i32) -> DbResult<()> {
        debug!(train_id, bogie_id, position, "Attaching bogie");

        sqlx::query(
            r#"
            INSERT INTO train_compositions (train_id, bogie_id, position, is_active)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(train_id, bogie_id) DO UPDATE SET
                position = excluded.position,
                is_active = 1
            "#,
        )
        .bind(train_id)
        .bind(bogie_id)
        .bind(position)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Marks the bogie inactive in the train's composition.
    pub async fn detach(&self, train_id: TrainId, bogie_id: BogieId) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE train_compositions SET is_active = 0 WHERE train_id = ?1 AND bogie_id = ?2",
        )
        .bind(train_id)
        .bind(bogie_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Composition",
                format!("bogie {} on train {}", bogie_id, train_id),
            ));
        }

        Ok(())
    }
}
