//! # Pricing Engine
//!
//! Produces an itemized fare for one journey on one bogie.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PriceRequest { train, from, to, bogie, berth? }                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. from ≠ to                                     ─┐                    │
//! │  2. Train, Bogie exist                              │ fatal: abort      │
//! │  3. Bogie active in the train's composition         │ before any        │
//! │  4. RouteDistanceIndex.get → distance_for_pricing  ─┘ component         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  5. Components (independent)                                            │
//! │     ┌──────────────┬──────────────────────────────────────────────┐     │
//! │     │ distance     │ distance:class=C                             │     │
//! │     │ train        │ train_type:type=T,class=C → base_fare        │     │
//! │     │ ac           │ n/a without AC; ac:bogie=B → ac:category=A   │     │
//! │     │ berth        │ n/a without berth/sleeper; berth:bogie=B,... │     │
//! │     └──────────────┴──────────────────────────────────────────────┘     │
//! │        nothing configured → MissingRangePolicy                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  6. subtotal = Σ components, adjustments = 0, total = subtotal          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Every component is a whole number of satang when it leaves its range
//! (see [`RatePerKm::fare_for`](crate::money::RatePerKm::fare_for)), so the
//! subtotal and total are exact sums of already-rounded components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::distance::Km;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::fare_range::{FareRange, FareRangeTable};
use crate::money::Money;
use crate::route_distance::RouteDistanceIndex;
use crate::scope::{
    AcBogieScope, AcCategoryScope, BerthScope, DistanceScope, FareScope, ScopeKey, TrainTypeScope,
};
use crate::store::FareStore;
use crate::types::{
    BerthType, Bogie, BogieId, ClassNumber, FareRangeId, StationId, Train, TrainId, TrainTypeId,
};
use crate::validation::validate_journey;

// =============================================================================
// Missing Range Policy
// =============================================================================

/// What a component does when no fare is configured for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRangePolicy {
    /// The component contributes 0 and a warning is attached to the
    /// breakdown.
    #[default]
    ZeroFallback,
    /// The calculation fails with [`CoreError::MissingConfiguration`].
    Strict,
}

impl MissingRangePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingRangePolicy::ZeroFallback => "zero_fallback",
            MissingRangePolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for MissingRangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingRangePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "zero_fallback" => Ok(MissingRangePolicy::ZeroFallback),
            "strict" => Ok(MissingRangePolicy::Strict),
            _ => Err(ValidationError::NotAllowed {
                field: "missing_range_policy".to_string(),
                allowed: vec!["zero_fallback".to_string(), "strict".to_string()],
            }),
        }
    }
}

// =============================================================================
// Request & Breakdown
// =============================================================================

/// One journey to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub train_id: TrainId,
    pub from_station_id: StationId,
    pub to_station_id: StationId,
    pub bogie_id: BogieId,
    #[serde(default)]
    pub berth_type: Option<BerthType>,
}

/// The four fare components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Distance,
    TrainType,
    Ac,
    Berth,
}

impl ComponentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Distance => "distance fare",
            ComponentKind::TrainType => "train fare",
            ComponentKind::Ac => "AC fare",
            ComponentKind::Berth => "berth fare",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a component's amount came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSource {
    /// A fare range matched the distance.
    Range {
        range_id: FareRangeId,
        scope_key: ScopeKey,
    },
    /// The train type's flat base fare.
    BaseFare { train_type_id: TrainTypeId },
    /// The component does not apply to this bogie or request.
    NotApplicable,
    /// Nothing configured; zero under [`MissingRangePolicy::ZeroFallback`].
    Missing,
}

/// One line of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareComponent {
    pub amount: Money,
    pub source: ComponentSource,
    /// Human-readable justification, for audit and debugging only.
    pub explanation: String,
}

impl FareComponent {
    fn from_range(what: &str, range: &FareRange, distance: Km) -> Self {
        let amount = range.fare_for(distance);
        FareComponent {
            amount,
            source: ComponentSource::Range {
                range_id: range.id,
                scope_key: range.scope_key.clone(),
            },
            explanation: format!(
                "{}: {} at {} in range {} {} = {}",
                what,
                range.rate,
                distance,
                range.id,
                range.describe_bounds(),
                amount
            ),
        }
    }

    fn not_applicable(explanation: String) -> Self {
        FareComponent {
            amount: Money::zero(),
            source: ComponentSource::NotApplicable,
            explanation,
        }
    }

    fn missing(explanation: String) -> Self {
        FareComponent {
            amount: Money::zero(),
            source: ComponentSource::Missing,
            explanation,
        }
    }
}

/// Non-fatal diagnostic attached to a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingWarning {
    pub component: ComponentKind,
    pub scope: String,
    pub message: String,
}

/// Who travels where, on what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySummary {
    pub train_id: TrainId,
    pub train_number: String,
    pub train_name: String,
    pub from_station_id: StationId,
    pub from_station: String,
    pub to_station_id: StationId,
    pub to_station: String,
    pub distance_km: Km,
    pub distance_for_pricing: Km,
    pub bogie_id: BogieId,
    pub bogie_code: String,
    pub class_number: ClassNumber,
    pub has_ac: bool,
    pub is_sleeper: bool,
    pub berth_type: Option<BerthType>,
}

/// Result of a price calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub calculation_id: Uuid,
    pub calculated_at: DateTime<Utc>,
    pub journey: JourneySummary,
    pub distance_fare: FareComponent,
    pub train_fare: FareComponent,
    pub ac_fare: FareComponent,
    pub berth_fare: FareComponent,
    pub subtotal: Money,
    /// Reserved for promotions; always zero.
    pub adjustments: Money,
    pub total: Money,
    pub warnings: Vec<PricingWarning>,
}

impl PriceBreakdown {
    pub fn components(&self) -> [(ComponentKind, &FareComponent); 4] {
        [
            (ComponentKind::Distance, &self.distance_fare),
            (ComponentKind::TrainType, &self.train_fare),
            (ComponentKind::Ac, &self.ac_fare),
            (ComponentKind::Berth, &self.berth_fare),
        ]
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Fare calculator over an injected [`FareStore`].
///
/// ## Usage
/// ```rust,ignore
/// let engine = PricingEngine::new(store).with_policy(MissingRangePolicy::Strict);
/// let breakdown = engine.calculate_price(&PriceRequest {
///     train_id: 1,
///     from_station_id: 1,
///     to_station_id: 2,
///     bogie_id: 10,
///     berth_type: None,
/// }).await?;
/// println!("{}", breakdown.total);
/// ```
pub struct PricingEngine<S> {
    store: S,
    policy: MissingRangePolicy,
}

impl<S: FareStore> PricingEngine<S> {
    pub fn new(store: S) -> Self {
        PricingEngine {
            store,
            policy: MissingRangePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingRangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MissingRangePolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> RouteDistanceIndex<'_, S> {
        RouteDistanceIndex::new(&self.store)
    }

    /// Range table for one fare category.
    pub fn table<K: FareScope>(&self) -> FareRangeTable<'_, S, K> {
        FareRangeTable::new(&self.store)
    }

    /// Prices one journey.
    ///
    /// ## Errors
    /// * `Validation` - origin equals destination
    /// * `NotFound` - train, bogie, composition membership or route distance
    /// * `MissingConfiguration` - a component has no fare under `Strict`
    pub async fn calculate_price(&self, request: &PriceRequest) -> CoreResult<PriceBreakdown> {
        validate_journey(request.from_station_id, request.to_station_id)?;

        debug!(
            train_id = request.train_id,
            from = request.from_station_id,
            to = request.to_station_id,
            bogie_id = request.bogie_id,
            berth = ?request.berth_type,
            "Calculating price"
        );

        let train = self
            .store
            .train(request.train_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Train", request.train_id))?;

        let bogie = self
            .store
            .bogie(request.bogie_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Bogie", request.bogie_id))?;

        if !self
            .store
            .is_bogie_in_composition(train.id, bogie.id)
            .await?
        {
            return Err(CoreError::not_found(
                "Composition",
                format!("bogie {} on train {}", bogie.id, train.id),
            ));
        }

        let route = self
            .index()
            .get(train.id, request.from_station_id, request.to_station_id)
            .await?;
        let distance = route.distance_for_pricing;

        let mut warnings = Vec::new();
        let distance_fare = self.distance_fare(&bogie, distance, &mut warnings).await?;
        let train_fare = self
            .train_fare(&train, &bogie, distance, &mut warnings)
            .await?;
        let ac_fare = self.ac_fare(&bogie, distance, &mut warnings).await?;
        let berth_fare = self
            .berth_fare(&bogie, request.berth_type, distance, &mut warnings)
            .await?;

        let subtotal = [&distance_fare, &train_fare, &ac_fare, &berth_fare]
            .iter()
            .map(|c| c.amount)
            .sum::<Money>();
        let adjustments = Money::zero();
        let total = subtotal + adjustments;

        let journey = JourneySummary {
            train_id: train.id,
            train_number: train.number.clone(),
            train_name: train.name.clone(),
            from_station_id: route.from_station_id,
            from_station: self.station_name(route.from_station_id).await?,
            to_station_id: route.to_station_id,
            to_station: self.station_name(route.to_station_id).await?,
            distance_km: route.distance_km,
            distance_for_pricing: distance,
            bogie_id: bogie.id,
            bogie_code: bogie.code.clone(),
            class_number: bogie.class_number,
            has_ac: bogie.has_ac,
            is_sleeper: bogie.is_sleeper,
            berth_type: request.berth_type,
        };

        let breakdown = PriceBreakdown {
            calculation_id: Uuid::new_v4(),
            calculated_at: Utc::now(),
            journey,
            distance_fare,
            train_fare,
            ac_fare,
            berth_fare,
            subtotal,
            adjustments,
            total,
            warnings,
        };

        info!(
            calculation_id = %breakdown.calculation_id,
            train_id = train.id,
            bogie_id = bogie.id,
            distance = %distance,
            total = %breakdown.total,
            warnings = breakdown.warnings.len(),
            "Price calculated"
        );

        Ok(breakdown)
    }

    async fn station_name(&self, id: StationId) -> CoreResult<String> {
        Ok(self
            .store
            .station(id)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| format!("Station {}", id)))
    }

    // =========================================================================
    // Components
    // =========================================================================

    async fn distance_fare(
        &self,
        bogie: &Bogie,
        distance: Km,
        warnings: &mut Vec<PricingWarning>,
    ) -> CoreResult<FareComponent> {
        let scope = DistanceScope {
            class: bogie.class_number,
        };
        let what = format!("Class {} distance fare", bogie.class_number);

        match self.table().lookup(&scope, distance).await? {
            Some(range) => Ok(FareComponent::from_range(&what, &range, distance)),
            None => self.missing(ComponentKind::Distance, scope.scope_key().to_string(), distance, warnings),
        }
    }

    async fn train_fare(
        &self,
        train: &Train,
        bogie: &Bogie,
        distance: Km,
        warnings: &mut Vec<PricingWarning>,
    ) -> CoreResult<FareComponent> {
        let scope = TrainTypeScope {
            train_type_id: train.train_type_id,
            class: bogie.class_number,
        };

        if let Some(range) = self.table().lookup(&scope, distance).await? {
            let what = format!("Train type {} class {} fare", train.train_type_id, bogie.class_number);
            return Ok(FareComponent::from_range(&what, &range, distance));
        }

        let train_type = self.store.train_type(train.train_type_id).await?;
        match train_type {
            Some(tt) => match tt.base_fare {
                Some(base_fare) => Ok(FareComponent {
                    amount: base_fare,
                    source: ComponentSource::BaseFare {
                        train_type_id: tt.id,
                    },
                    explanation: format!("{} base fare {}", tt.name, base_fare),
                }),
                None => self.missing(ComponentKind::TrainType, scope.scope_key().to_string(), distance, warnings),
            },
            None => self.missing(ComponentKind::TrainType, scope.scope_key().to_string(), distance, warnings),
        }
    }

    async fn ac_fare(
        &self,
        bogie: &Bogie,
        distance: Km,
        warnings: &mut Vec<PricingWarning>,
    ) -> CoreResult<FareComponent> {
        if !bogie.has_ac {
            return Ok(FareComponent::not_applicable(format!(
                "Bogie {} has no AC",
                bogie.code
            )));
        }

        let bogie_scope = AcBogieScope { bogie_id: bogie.id };
        if let Some(range) = self.table().lookup(&bogie_scope, distance).await? {
            let what = format!("AC fare for bogie {}", bogie.code);
            return Ok(FareComponent::from_range(&what, &range, distance));
        }

        let mut tried = bogie_scope.scope_key().to_string();

        if let Some(category_id) = bogie.ac_fare_category_id {
            let category_scope = AcCategoryScope { category_id };
            if let Some(range) = self.table().lookup(&category_scope, distance).await? {
                let what = format!("AC category {} fare", category_id);
                return Ok(FareComponent::from_range(&what, &range, distance));
            }
            tried = format!("{} | {}", tried, category_scope.scope_key());
        }

        self.missing(ComponentKind::Ac, tried, distance, warnings)
    }

    async fn berth_fare(
        &self,
        bogie: &Bogie,
        berth: Option<BerthType>,
        distance: Km,
        warnings: &mut Vec<PricingWarning>,
    ) -> CoreResult<FareComponent> {
        let berth = match berth {
            Some(berth) if bogie.is_sleeper => berth,
            Some(_) => {
                return Ok(FareComponent::not_applicable(format!(
                    "Bogie {} is not a sleeper",
                    bogie.code
                )))
            }
            None => {
                return Ok(FareComponent::not_applicable(
                    "No berth requested".to_string(),
                ))
            }
        };

        let scope = BerthScope {
            bogie_id: bogie.id,
            berth,
        };

        match self.table().lookup(&scope, distance).await? {
            Some(range) => {
                let what = format!("{} berth fare for bogie {}", berth, bogie.code);
                Ok(FareComponent::from_range(&what, &range, distance))
            }
            None => self.missing(ComponentKind::Berth, scope.scope_key().to_string(), distance, warnings),
        }
    }

    /// Applies the missing-range policy to a component with no fare.
    fn missing(
        &self,
        component: ComponentKind,
        scope: String,
        distance: Km,
        warnings: &mut Vec<PricingWarning>,
    ) -> CoreResult<FareComponent> {
        match self.policy {
            MissingRangePolicy::Strict => Err(CoreError::MissingConfiguration {
                component: component.label(),
                scope,
            }),
            MissingRangePolicy::ZeroFallback => {
                let message = format!("No {} configured at {} for {}", component, distance, scope);
                warn!(component = %component, scope = %scope, distance = %distance, "No fare configured, using zero");

                let explanation = format!("{}, contributes {}", message, Money::zero());
                warnings.push(PricingWarning {
                    component,
                    scope,
                    message,
                });
                Ok(FareComponent::missing(explanation))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare_range::FareRangeDraft;
    use crate::memory::MemoryStore;
    use crate::money::RatePerKm;
    use crate::types::{BerthLayout, Station, Stop, TrainType};

    const PLAIN: BogieId = 10;
    const AC: BogieId = 11;
    const SLEEPER: BogieId = 12;
    const AC_CATEGORY: BogieId = 13;
    const DETACHED: BogieId = 99;

    fn km(whole: i64) -> Km {
        Km::from_whole(whole)
    }

    fn bogie(id: BogieId, has_ac: bool, is_sleeper: bool, category: Option<i64>) -> Bogie {
        Bogie {
            id,
            code: format!("B{}", id),
            class_number: ClassNumber::SECOND,
            has_ac,
            is_sleeper,
            berths: if is_sleeper {
                BerthLayout { upper: 20, lower: 20, single: 0 }
            } else {
                BerthLayout::default()
            },
            ac_fare_category_id: category,
        }
    }

    fn station(id: StationId, name: &str) -> Station {
        Station {
            id,
            code: name[..3].to_uppercase(),
            name: name.to_string(),
            distance_actual: None,
            distance_for_pricing: None,
        }
    }

    fn train(id: TrainId, stops: &[(StationId, f64)]) -> Train {
        Train {
            id,
            number: id.to_string(),
            name: format!("Express {}", id),
            train_type_id: 1,
            stops: stops
                .iter()
                .enumerate()
                .map(|(i, (station_id, d))| Stop {
                    station_id: *station_id,
                    stop_order: i as i32 + 1,
                    distance_from_origin: Some(Km::from_f64(*d)),
                    is_active: true,
                })
                .collect(),
            stops_revision: 0,
        }
    }

    /// Train 1 runs Krung Thep Aphiwat → Nakhon Ratchasima (264.1 km),
    /// train 2 runs Krung Thep Aphiwat → Bua Yai (300 km). Class 2
    /// distance ranges `[0,300)` flat 50 and `[300,600)` flat 90, train
    /// type base fare 150.
    async fn fixture() -> PricingEngine<MemoryStore> {
        let store = MemoryStore::new();
        store.put_station(station(1, "Krung Thep Aphiwat"));
        store.put_station(station(2, "Nakhon Ratchasima"));
        store.put_station(station(3, "Bua Yai"));
        store.put_train_type(TrainType {
            id: 1,
            code: "SP".to_string(),
            name: "Special Express".to_string(),
            base_fare: Some(Money::from_baht(150)),
        });
        store.put_train(train(1, &[(1, 0.0), (2, 264.1)]));
        store.put_train(train(2, &[(1, 0.0), (3, 300.0)]));

        for b in [
            bogie(PLAIN, false, false, None),
            bogie(AC, true, false, None),
            bogie(SLEEPER, false, true, None),
            bogie(AC_CATEGORY, true, false, Some(4)),
            bogie(DETACHED, false, false, None),
        ] {
            store.put_bogie(b);
        }
        for train_id in [1, 2] {
            for b in [PLAIN, AC, SLEEPER, AC_CATEGORY] {
                store.attach_bogie(train_id, b);
            }
        }

        let engine = PricingEngine::new(store);
        let second = DistanceScope { class: ClassNumber::SECOND };
        let distance = engine.table::<DistanceScope>();
        distance
            .insert(
                &second,
                &FareRangeDraft {
                    min_km: km(0),
                    max_km: Some(km(300)),
                    per_km_rate: Some(RatePerKm::from_ten_thousandths(0)),
                    flat_rate: Some(Money::from_baht(50)),
                },
            )
            .await
            .unwrap();
        distance
            .insert(&second, &FareRangeDraft::flat(km(300), Some(km(600)), Money::from_baht(90)))
            .await
            .unwrap();

        engine
    }

    fn request(train_id: TrainId, to: StationId, bogie_id: BogieId) -> PriceRequest {
        PriceRequest {
            train_id,
            from_station_id: 1,
            to_station_id: to,
            bogie_id,
            berth_type: None,
        }
    }

    #[tokio::test]
    async fn test_plain_bogie_total() {
        let engine = fixture().await;
        let b = engine.calculate_price(&request(1, 2, PLAIN)).await.unwrap();

        assert_eq!(b.distance_fare.amount, Money::from_baht(50));
        assert_eq!(b.train_fare.amount, Money::from_baht(150));
        assert_eq!(b.train_fare.source, ComponentSource::BaseFare { train_type_id: 1 });
        assert_eq!(b.ac_fare.source, ComponentSource::NotApplicable);
        assert_eq!(b.berth_fare.source, ComponentSource::NotApplicable);
        assert_eq!(b.adjustments, Money::zero());
        assert_eq!(b.total.to_decimal_string(), "200.00");
        assert!(b.warnings.is_empty());

        assert_eq!(b.journey.distance_for_pricing, Km::from_hundredths(26410));
        assert_eq!(b.journey.from_station, "Krung Thep Aphiwat");
        assert_eq!(b.journey.to_station, "Nakhon Ratchasima");
    }

    #[tokio::test]
    async fn test_bogie_specific_ac_fare() {
        let engine = fixture().await;
        engine
            .table::<AcBogieScope>()
            .insert(
                &AcBogieScope { bogie_id: AC },
                &FareRangeDraft::flat(km(0), None, Money::from_baht(80)),
            )
            .await
            .unwrap();

        let b = engine.calculate_price(&request(1, 2, AC)).await.unwrap();
        assert_eq!(b.ac_fare.amount, Money::from_baht(80));
        assert_eq!(b.total.to_decimal_string(), "280.00");
    }

    #[tokio::test]
    async fn test_ac_falls_back_to_category() {
        let engine = fixture().await;
        engine
            .table::<AcCategoryScope>()
            .insert(
                &AcCategoryScope { category_id: 4 },
                &FareRangeDraft::flat(km(0), None, Money::from_baht(60)),
            )
            .await
            .unwrap();

        let b = engine.calculate_price(&request(1, 2, AC_CATEGORY)).await.unwrap();
        assert_eq!(b.ac_fare.amount, Money::from_baht(60));
        assert!(matches!(
            &b.ac_fare.source,
            ComponentSource::Range { scope_key, .. } if scope_key.as_str() == "ac:category=4"
        ));
    }

    #[tokio::test]
    async fn test_lower_berth_fare_included() {
        let engine = fixture().await;
        engine
            .table::<BerthScope>()
            .insert(
                &BerthScope { bogie_id: SLEEPER, berth: BerthType::Lower },
                &FareRangeDraft::flat(km(0), Some(km(500)), Money::from_baht(100)),
            )
            .await
            .unwrap();

        let mut req = request(1, 2, SLEEPER);
        req.berth_type = Some(BerthType::Lower);
        let b = engine.calculate_price(&req).await.unwrap();

        assert_eq!(b.berth_fare.amount, Money::from_baht(100));
        assert_eq!(b.total, Money::from_baht(300));

        // berth requested on a seated bogie does not apply
        let mut seated = request(1, 2, PLAIN);
        seated.berth_type = Some(BerthType::Lower);
        let b = engine.calculate_price(&seated).await.unwrap();
        assert_eq!(b.berth_fare.source, ComponentSource::NotApplicable);
        assert!(b.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_boundary_distance_uses_upper_range() {
        let engine = fixture().await;
        let b = engine.calculate_price(&request(2, 3, PLAIN)).await.unwrap();

        assert_eq!(b.journey.distance_for_pricing, km(300));
        assert_eq!(b.distance_fare.amount, Money::from_baht(90));
        assert_eq!(b.total, Money::from_baht(240));
    }

    #[tokio::test]
    async fn test_detached_bogie_fails_before_components() {
        let engine = fixture().await;
        let result = engine.calculate_price(&request(1, 2, DETACHED)).await;

        assert!(matches!(
            result,
            Err(CoreError::NotFound { entity: "Composition", .. })
        ));
        // never reached the distance index
        assert_eq!(engine.store().route_distance_count(1), 0);

        // a bogie taken out of the composition stops pricing on that train
        engine.store().detach_bogie(1, PLAIN);
        assert!(matches!(
            engine.calculate_price(&request(1, 2, PLAIN)).await,
            Err(CoreError::NotFound { entity: "Composition", .. })
        ));
        assert!(engine.calculate_price(&request(2, 3, PLAIN)).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_ac_fare_is_zero_with_warning() {
        let engine = fixture().await;
        let b = engine.calculate_price(&request(1, 2, AC)).await.unwrap();

        assert_eq!(b.ac_fare.amount, Money::zero());
        assert_eq!(b.ac_fare.source, ComponentSource::Missing);
        // the other three components are unaffected
        assert_eq!(b.distance_fare.amount, Money::from_baht(50));
        assert_eq!(b.train_fare.amount, Money::from_baht(150));
        assert_eq!(b.total.to_decimal_string(), "200.00");

        assert_eq!(b.warnings.len(), 1);
        assert_eq!(b.warnings[0].component, ComponentKind::Ac);
        assert_eq!(b.warnings[0].scope, "ac:bogie=11");
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_missing_configuration() {
        let engine = fixture().await.with_policy(MissingRangePolicy::Strict);

        assert!(engine.calculate_price(&request(1, 2, PLAIN)).await.is_ok());
        assert!(matches!(
            engine.calculate_price(&request(1, 2, AC_CATEGORY)).await,
            Err(CoreError::MissingConfiguration { component: "AC fare", .. })
        ));
    }

    #[tokio::test]
    async fn test_train_type_range_overrides_base_fare() {
        let engine = fixture().await;
        engine
            .table::<TrainTypeScope>()
            .insert(
                &TrainTypeScope { train_type_id: 1, class: ClassNumber::SECOND },
                &FareRangeDraft::flat(km(0), None, Money::from_baht(170)),
            )
            .await
            .unwrap();

        let b = engine.calculate_price(&request(1, 2, PLAIN)).await.unwrap();
        assert_eq!(b.train_fare.amount, Money::from_baht(170));
        assert!(matches!(b.train_fare.source, ComponentSource::Range { .. }));
    }

    #[tokio::test]
    async fn test_per_km_components_sum_to_the_satang() {
        let engine = fixture().await;
        // ฿0.3500/km over 264.10 km = ฿92.435, rounds to ฿92.44
        engine
            .table::<AcBogieScope>()
            .insert(
                &AcBogieScope { bogie_id: AC },
                &FareRangeDraft::per_km(km(0), None, RatePerKm::from_ten_thousandths(3500)),
            )
            .await
            .unwrap();

        let b = engine.calculate_price(&request(1, 2, AC)).await.unwrap();
        assert_eq!(b.ac_fare.amount.satang(), 9244);

        let manual: i64 = b.components().iter().map(|(_, c)| c.amount.satang()).sum();
        assert_eq!(b.subtotal.satang(), manual);
        assert_eq!(b.total.to_decimal_string(), "292.44");
    }

    #[tokio::test]
    async fn test_reverse_journey_same_price() {
        let engine = fixture().await;
        let out = engine.calculate_price(&request(1, 2, PLAIN)).await.unwrap();
        let back = engine
            .calculate_price(&PriceRequest {
                from_station_id: 2,
                to_station_id: 1,
                ..request(1, 2, PLAIN)
            })
            .await
            .unwrap();

        assert_eq!(out.total, back.total);
        assert_eq!(back.journey.from_station, "Nakhon Ratchasima");
        assert_ne!(out.calculation_id, back.calculation_id);
    }

    #[tokio::test]
    async fn test_fatal_lookups() {
        let engine = fixture().await;

        assert!(matches!(
            engine.calculate_price(&request(1, 1, PLAIN)).await,
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            engine.calculate_price(&request(7, 2, PLAIN)).await,
            Err(CoreError::NotFound { entity: "Train", .. })
        ));
        assert!(matches!(
            engine.calculate_price(&request(1, 2, 404)).await,
            Err(CoreError::NotFound { entity: "Bogie", .. })
        ));
        assert!(matches!(
            engine.calculate_price(&request(1, 3, PLAIN)).await,
            Err(CoreError::NotFound { entity: "Route distance", .. })
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<MissingRangePolicy>().unwrap(), MissingRangePolicy::Strict);
        assert_eq!(
            "Zero-Fallback".parse::<MissingRangePolicy>().unwrap(),
            MissingRangePolicy::ZeroFallback
        );
        assert!("lenient".parse::<MissingRangePolicy>().is_err());
        assert_eq!(MissingRangePolicy::default(), MissingRangePolicy::ZeroFallback);
    }
}
