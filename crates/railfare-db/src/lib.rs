//! # railfare-db: Database Layer for Railfare
//!
//! SQLite persistence for the fare engine, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Railfare Data Flow                               │
//! │                                                                         │
//! │  PricingEngine::calculate_price (railfare-core)                        │
//! │       │  FareStore                                                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   railfare-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Stations      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Trains        │    │ 001_initial_ │  │   │
//! │  │   │ impl          │    │ Bogies        │    │  schema.sql  │  │   │
//! │  │   │  FareStore    │    │ RouteDistances│    │              │  │   │
//! │  │   │ (store.rs)    │    │ FareRanges    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - `store` - `FareStore` implementation for [`Database`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use railfare_core::{PricingEngine, PriceRequest};
//! use railfare_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("railfare.db")).await?;
//! let engine = PricingEngine::new(db);
//! let breakdown = engine.calculate_price(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bogie::BogieRepository;
pub use repository::fare_range::FareRangeRepository;
pub use repository::route_distance::RouteDistanceRepository;
pub use repository::station::StationRepository;
pub use repository::train::TrainRepository;
