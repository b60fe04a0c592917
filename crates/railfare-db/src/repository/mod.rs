//! # Repository Module
//!
//! Database repository implementations for Railfare.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  FareStore for Database (store.rs)                                     │
//! │       │                                                                 │
//! │       │  db.ranges().insert(&scope, &range)                             │
//! │       ▼                                                                 │
//! │  FareRangeRepository                                                   │
//! │  ├── list(&self, scope)                                                │
//! │  ├── get(&self, id)                                                    │
//! │  ├── insert(&self, scope, range)    one transaction                    │
//! │  ├── update(&self, id, range)       one transaction                    │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `#[derive(sqlx::FromRow)]` structs and
//! converted into `railfare-core` types at the repository boundary, so the
//! core crate never depends on sqlx.
//!
//! ## Available Repositories
//!
//! - [`StationRepository`](station::StationRepository) - Stations
//! - [`TrainRepository`](train::TrainRepository) - Trains, stops, train types
//! - [`BogieRepository`](bogie::BogieRepository) - Bogies, AC categories, compositions
//! - [`RouteDistanceRepository`](route_distance::RouteDistanceRepository) - Route distance cache
//! - [`FareRangeRepository`](fare_range::FareRangeRepository) - Fare ranges

pub mod bogie;
pub mod fare_range;
pub mod route_distance;
pub mod station;
pub mod train;
