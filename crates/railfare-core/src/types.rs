//! # Domain Types
//!
//! The rail network as the fare engine sees it.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TrainType    │◄──│      Train      │──►│      Stop       │ 1..n  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  base_fare?     │   │  number         │   │  stop_order     │       │
//! │  └─────────────────┘   │  train_type_id  │   │  station_id ────┼──┐    │
//! │                        └────────┬────────┘   │  distance_from  │  │    │
//! │                                 │ composition│  _origin?       │  │    │
//! │                                 ▼            └─────────────────┘  │    │
//! │                        ┌─────────────────┐   ┌─────────────────┐  │    │
//! │                        │      Bogie      │   │     Station     │◄─┘    │
//! │                        │  class 1..=3    │   │  distance_actual?│      │
//! │                        │  has_ac         │   │  distance_for_  │       │
//! │                        │  is_sleeper     │   │  pricing?       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::distance::Km;
use crate::error::ValidationError;
use crate::money::Money;

pub type TrainId = i64;
pub type StationId = i64;
pub type BogieId = i64;
pub type TrainTypeId = i64;
pub type AcCategoryId = i64;
pub type FareRangeId = i64;

// =============================================================================
// Station
// =============================================================================

/// A station on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub code: String,
    pub name: String,
    /// Measured distance from the network reference point.
    pub distance_actual: Option<Km>,
    /// Tariff distance from the network reference point.
    pub distance_for_pricing: Option<Km>,
}

// =============================================================================
// Train & Stops
// =============================================================================

/// One call of a train at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub station_id: StationId,
    /// Total order of the stop within its train.
    pub stop_order: i32,
    /// Route distance from the train's first stop, when surveyed.
    pub distance_from_origin: Option<Km>,
    pub is_active: bool,
}

/// A scheduled train with its stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    /// Public train number, e.g. "21".
    pub number: String,
    pub name: String,
    pub train_type_id: TrainTypeId,
    pub stops: Vec<Stop>,
    /// Store-assigned counter, bumped on every stop-list edit. Cached route
    /// distances are only written against the revision they were derived
    /// from. Ignored when a train is written.
    #[serde(default)]
    pub stops_revision: i64,
}

impl Train {
    /// Active stops sorted by stop order.
    pub fn active_stops(&self) -> Vec<&Stop> {
        let mut stops: Vec<&Stop> = self.stops.iter().filter(|s| s.is_active).collect();
        stops.sort_by_key(|s| s.stop_order);
        stops
    }
}

/// A train type (Special Express, Rapid, Ordinary...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainType {
    pub id: TrainTypeId,
    pub code: String,
    pub name: String,
    /// Flat surcharge used when no class-specific range is configured.
    pub base_fare: Option<Money>,
}

// =============================================================================
// Class Number
// =============================================================================

/// Travel class of a bogie: 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ClassNumber(u8);

impl ClassNumber {
    pub const FIRST: ClassNumber = ClassNumber(1);
    pub const SECOND: ClassNumber = ClassNumber(2);
    pub const THIRD: ClassNumber = ClassNumber(3);

    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ClassNumber {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(ClassNumber(value))
        } else {
            Err(ValidationError::OutOfRange {
                field: "class_number".to_string(),
                min: 1,
                max: 3,
            })
        }
    }
}

impl TryFrom<i64> for ClassNumber {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ValidationError::OutOfRange {
                field: "class_number".to_string(),
                min: 1,
                max: 3,
            })
            .and_then(|class: u8| ClassNumber::try_from(class))
    }
}

impl From<ClassNumber> for u8 {
    fn from(value: ClassNumber) -> Self {
        value.0
    }
}

impl fmt::Display for ClassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Berth Type
// =============================================================================

/// A sleeping position within a sleeper bogie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BerthType {
    Upper,
    Lower,
    Single,
}

impl BerthType {
    pub const ALL: [BerthType; 3] = [BerthType::Upper, BerthType::Lower, BerthType::Single];

    pub fn as_str(&self) -> &'static str {
        match self {
            BerthType::Upper => "upper",
            BerthType::Lower => "lower",
            BerthType::Single => "single",
        }
    }
}

impl fmt::Display for BerthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BerthType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upper" => Ok(BerthType::Upper),
            "lower" => Ok(BerthType::Lower),
            "single" => Ok(BerthType::Single),
            _ => Err(ValidationError::NotAllowed {
                field: "berth_type".to_string(),
                allowed: BerthType::ALL.iter().map(|b| b.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Bogie
// =============================================================================

/// Number of berths of each type in a sleeper bogie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BerthLayout {
    pub upper: u16,
    pub lower: u16,
    pub single: u16,
}

impl BerthLayout {
    pub fn count(&self, berth: BerthType) -> u16 {
        match berth {
            BerthType::Upper => self.upper,
            BerthType::Lower => self.lower,
            BerthType::Single => self.single,
        }
    }
}

/// A coach configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bogie {
    pub id: BogieId,
    pub code: String,
    pub class_number: ClassNumber,
    pub has_ac: bool,
    pub is_sleeper: bool,
    pub berths: BerthLayout,
    /// Category-level AC tariff used when the bogie has no AC ranges of its own.
    pub ac_fare_category_id: Option<AcCategoryId>,
}

// =============================================================================
// Route Distance
// =============================================================================

/// Cached distance between two stations on one train's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDistance {
    pub train_id: TrainId,
    pub from_station_id: StationId,
    pub to_station_id: StationId,
    pub distance_km: Km,
    pub distance_for_pricing: Km,
}

impl RouteDistance {
    /// Whether this record joins `a` and `b`, in either direction.
    pub fn connects(&self, a: StationId, b: StationId) -> bool {
        (self.from_station_id == a && self.to_station_id == b)
            || (self.from_station_id == b && self.to_station_id == a)
    }

    /// The same distance with `from` and `to` swapped.
    pub fn reversed(&self) -> RouteDistance {
        RouteDistance {
            from_station_id: self.to_station_id,
            to_station_id: self.from_station_id,
            ..*self
        }
    }

    /// Orients the record so it reads `from → to`.
    pub fn oriented(&self, from: StationId) -> RouteDistance {
        if self.from_station_id == from {
            *self
        } else {
            self.reversed()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
