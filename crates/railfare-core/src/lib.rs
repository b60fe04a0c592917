//! # railfare-core: Fare Calculation for Scheduled Rail Services
//!
//! This crate answers one question: what does a seat (or berth) on train X,
//! bogie Y, from station A to station B cost? It holds the fare logic and
//! talks to persistence only through the [`store::FareStore`] trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rail Fare Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                fare-quote (command line)                        │   │
//! │  │        config ──► logging ──► quote / rebuild ──► JSON          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ railfare-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐   ┌─────────────┐   ┌─────────────────────┐  │   │
//! │  │   │   pricing   │──►│route_distance│   │     fare_range      │  │   │
//! │  │   │PricingEngine│──►│    Index    │   │  FareRangeTable<K>  │  │   │
//! │  │   └──────┬──────┘   └─────────────┘   └─────────────────────┘  │   │
//! │  │          └───────────────────────────────────────▲              │   │
//! │  │                                                                 │   │
//! │  │   types • money • distance • scope • validation • error        │   │
//! │  │                                                                 │   │
//! │  │   store::FareStore ◄── memory::MemoryStore                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ FareStore                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 railfare-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stations, trains, stops, bogies, route distances
//! - [`money`] - Money in satang and per-km rates (no floating point)
//! - [`distance`] - Kilometres in hundredths
//! - [`scope`] - Fare category scopes and their keys
//! - [`fare_range`] - Range tables: validation, overlap, lookup
//! - [`route_distance`] - Pairwise distances along a train's route
//! - [`pricing`] - The pricing engine and the price breakdown
//! - [`store`] - Persistence trait
//! - [`memory`] - In-memory store
//! - [`error`] - Error types
//! - [`validation`] - Input rules
//!
//! ## Design Principles
//!
//! 1. **Injected Persistence**: no global connection, the store is passed in
//! 2. **Integer Units**: satang and hundredths of a km, so rounding is exact
//! 3. **One Range Abstraction**: every fare category uses `FareRangeTable`
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use railfare_core::distance::Km;
//! use railfare_core::money::RatePerKm;
//!
//! // ฿0.35 per km
//! let rate = RatePerKm::from_ten_thousandths(3500);
//!
//! // 264.10 km → ฿92.435 → ฿92.44
//! let fare = rate.fare_for(Km::from_hundredths(26410));
//! assert_eq!(fare.satang(), 9244);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod distance;
pub mod error;
pub mod fare_range;
pub mod memory;
pub mod money;
pub mod pricing;
pub mod route_distance;
pub mod scope;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use distance::Km;
pub use error::{CoreError, CoreResult, StoreError, StoreResult, ValidationError};
pub use fare_range::{FareRange, FareRangeDraft, FareRangePatch, FareRangeTable, FareRate, NewFareRange};
pub use memory::MemoryStore;
pub use money::{Money, RatePerKm};
pub use pricing::{MissingRangePolicy, PriceBreakdown, PriceRequest, PricingEngine};
pub use route_distance::RouteDistanceIndex;
pub use scope::{FareScope, ScopeKey};
pub use store::FareStore;
pub use types::*;
