//! # Database Pool Management
//!
//! Opens the SQLite file behind a fare deployment and hands out repositories.
//!
//! ## Who Holds a Connection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Railfare Connection Pool                           │
//! │                                                                         │
//! │  fare-quote / seed                                                     │
//! │       │  DbConfig::new("railfare.db").max_connections(5)               │
//! │       ▼                                                                 │
//! │  Database::new ── WAL, foreign keys, busy timeout, migrations          │
//! │       │                                                                 │
//! │       ├──► price lookups        readers, never blocked by WAL writers  │
//! │       ├──► route distance save  one write txn per train                │
//! │       └──► fare range writes    one write txn per mutation             │
//! │                                                                         │
//! │  Writers serialize on SQLite's single write lock and wait up to        │
//! │  `busy_timeout` for it instead of failing with SQLITE_BUSY.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::bogie::BogieRepository;
use crate::repository::fare_range::FareRangeRepository;
use crate::repository::route_distance::RouteDistanceRepository;
use crate::repository::station::StationRepository;
use crate::repository::train::TrainRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the fare database lives and how many connections may touch it.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/railfare/railfare.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open.
    pub database_path: PathBuf,

    /// Pool ceiling. Default: 5.
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1.
    pub min_connections: u32,

    /// How long `Database::new` and queries wait for a free connection.
    pub acquire_timeout: Duration,

    pub idle_timeout: Duration,

    /// How long a writer waits for the SQLite write lock. Default: 5 s.
    pub busy_timeout: Duration,

    /// Apply embedded migrations on open. Default: true.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` opens its own empty database, so
    /// the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(":memory:")
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle on the fare database.
///
/// Cheap to clone (the pool is reference counted). Besides the repository
/// accessors it implements [`FareStore`](railfare_core::store::FareStore),
/// which is how the pricing engine reaches it:
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("railfare.db")).await?;
/// let engine = PricingEngine::new(db.clone());
/// let breakdown = engine.calculate_price(&request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file and applies migrations when
    /// `config.run_migrations` is set.
    ///
    /// Every connection runs in WAL mode with `synchronous = NORMAL`,
    /// foreign keys on and `config.busy_timeout` as its busy handler.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening fare database");

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // compositions and stops reference trains, bogies and stations
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!(busy_timeout = ?config.busy_timeout, "SQLite options ready");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Fare database pool open");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// `(known, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool, for statements no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stations(&self) -> StationRepository {
        StationRepository::new(self.pool.clone())
    }

    /// Trains, their stops and train types.
    pub fn trains(&self) -> TrainRepository {
        TrainRepository::new(self.pool.clone())
    }

    /// Bogies, AC fare categories and compositions.
    pub fn bogies(&self) -> BogieRepository {
        BogieRepository::new(self.pool.clone())
    }

    pub fn route_distances(&self) -> RouteDistanceRepository {
        RouteDistanceRepository::new(self.pool.clone())
    }

    pub fn ranges(&self) -> FareRangeRepository {
        FareRangeRepository::new(self.pool.clone())
    }

    /// Closes every connection; later queries fail.
    pub async fn close(&self) {
        info!("Closing fare database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
