//! # Fare Scopes
//!
//! A scope names one family of fare ranges that must not overlap each other.
//! Each fare category has its own scope type; all of them render to a
//! canonical [`ScopeKey`] string, which is what the store persists.
//!
//! | Category | Scope type | Key example |
//! |----------|------------|-------------|
//! | Distance fare | [`DistanceScope`] | `distance:class=2` |
//! | Train-type fare | [`TrainTypeScope`] | `train_type:type=3,class=2` |
//! | AC fare (bogie) | [`AcBogieScope`] | `ac:bogie=17` |
//! | AC fare (category) | [`AcCategoryScope`] | `ac:category=4` |
//! | Berth fare | [`BerthScope`] | `berth:bogie=17,berth=lower` |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{AcCategoryId, BerthType, BogieId, ClassNumber, TrainTypeId};

/// Canonical, persisted identifier of a fare scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Wraps a key read back from storage.
    pub fn from_stored(key: impl Into<String>) -> Self {
        ScopeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key belongs to `category`.
    pub fn is_in(&self, category: FareCategory) -> bool {
        self.0
            .strip_prefix(category.prefix())
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fare categories that own range tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FareCategory {
    Distance,
    TrainType,
    AcBogie,
    AcCategory,
    Berth,
}

impl FareCategory {
    /// Key prefix. Both AC categories share `ac`; the remainder tells them apart.
    pub fn prefix(&self) -> &'static str {
        match self {
            FareCategory::Distance => "distance",
            FareCategory::TrainType => "train_type",
            FareCategory::AcBogie | FareCategory::AcCategory => "ac",
            FareCategory::Berth => "berth",
        }
    }
}

/// A typed scope that can be rendered to its storage key.
pub trait FareScope: fmt::Debug + Send + Sync {
    const CATEGORY: FareCategory;

    fn scope_key(&self) -> ScopeKey;
}

/// Distance fare by travel class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistanceScope {
    pub class: ClassNumber,
}

impl FareScope for DistanceScope {
    const CATEGORY: FareCategory = FareCategory::Distance;

    fn scope_key(&self) -> ScopeKey {
        ScopeKey(format!("distance:class={}", self.class))
    }
}

/// Train-type surcharge by train type and class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrainTypeScope {
    pub train_type_id: TrainTypeId,
    pub class: ClassNumber,
}

impl FareScope for TrainTypeScope {
    const CATEGORY: FareCategory = FareCategory::TrainType;

    fn scope_key(&self) -> ScopeKey {
        ScopeKey(format!(
            "train_type:type={},class={}",
            self.train_type_id, self.class
        ))
    }
}

/// AC surcharge configured on one bogie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcBogieScope {
    pub bogie_id: BogieId,
}

impl FareScope for AcBogieScope {
    const CATEGORY: FareCategory = FareCategory::AcBogie;

    fn scope_key(&self) -> ScopeKey {
        ScopeKey(format!("ac:bogie={}", self.bogie_id))
    }
}

/// AC surcharge shared by every bogie in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcCategoryScope {
    pub category_id: AcCategoryId,
}

impl FareScope for AcCategoryScope {
    const CATEGORY: FareCategory = FareCategory::AcCategory;

    fn scope_key(&self) -> ScopeKey {
        ScopeKey(format!("ac:category={}", self.category_id))
    }
}

/// Berth surcharge by bogie and berth type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerthScope {
    pub bogie_id: BogieId,
    pub berth: BerthType,
}

impl FareScope for BerthScope {
    const CATEGORY: FareCategory = FareCategory::Berth;

    fn scope_key(&self) -> ScopeKey {
        ScopeKey(format!("berth:bogie={},berth={}", self.bogie_id, self.berth))
    }
}
