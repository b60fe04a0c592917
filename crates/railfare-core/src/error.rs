//! # Error Types
//!
//! Domain-specific error types for railfare-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  railfare-core errors (this file)                                      │
//! │  ├── CoreError        - Pricing and range-table failures               │
//! │  ├── ValidationError  - Malformed requests and range definitions       │
//! │  └── StoreError       - What a FareStore implementation reports        │
//! │                                                                         │
//! │  railfare-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures → StoreError       │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → caller                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! | Variant | Fatal? | Raised by |
//! |---------|--------|-----------|
//! | `NotFound` | yes | train, bogie, composition, route distance |
//! | `Validation` | yes | range mutation, malformed request |
//! | `RangeConflict` | yes | range insert/update overlapping a neighbour |
//! | `MissingConfiguration` | only under `MissingRangePolicy::Strict` | pricing |

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors surfaced by the pricing engine, the route-distance index and the
/// fare range tables.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity the calculation depends on is missing.
    ///
    /// ## When This Occurs
    /// - Train or bogie id doesn't exist
    /// - Bogie is not an active member of the train's composition
    /// - No route distance can be derived between the two stations
    /// - Range id passed to update doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A new or updated fare range overlaps an existing one in its scope.
    /// The mutation was rejected in full.
    #[error("Fare range overlaps an existing range in scope {scope}{}", existing_suffix(.existing_id))]
    RangeConflict {
        scope: String,
        existing_id: Option<i64>,
    },

    /// No fare range applies to a component and the active policy is strict.
    #[error("No {component} configured for scope {scope}")]
    MissingConfiguration {
        component: &'static str,
        scope: String,
    },

    /// The persistence collaborator failed.
    #[error("Storage error: {0}")]
    Store(String),
}

fn existing_suffix(existing_id: &Option<i64>) -> String {
    match existing_id {
        Some(id) => format!(" (range {})", id),
        None => String::new(),
    }
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { scope, existing_id } => {
                CoreError::RangeConflict { scope, existing_id }
            }
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Backend(msg) => CoreError::Store(msg),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Never silently corrected: the caller attempting the mutation (or the
/// price request) receives the error as-is.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Range upper bound is not above its lower bound.
    #[error("max_km ({max}) must be greater than min_km ({min})")]
    InvalidRange { min: String, max: String },

    /// Both a per-km rate and a flat rate were given.
    #[error("only one of per_km_rate and flat_rate may be set")]
    AmbiguousRate,

    /// Invalid format (e.g. unknown berth type).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors reported by a [`FareStore`](crate::store::FareStore) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The range mutation would overlap another range in the same scope.
    #[error("overlapping fare range in scope {scope}")]
    Conflict {
        scope: String,
        existing_id: Option<i64>,
    },

    /// The record targeted by a mutation does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Any other backend failure (connection, query, migration).
    #[error("{0}")]
    Backend(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type returned by every `FareStore` method.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
