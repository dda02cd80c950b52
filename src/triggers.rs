//! Trigger rules: deterministic predicates deciding whether an event counts
//! against a unit.
//!
//! Every rule fails with [`PricingError::Configuration`] rather than returning
//! `false` when a field it needs is absent, so a misconfigured product can never
//! price silently at zero. Fields are checked lazily in predicate order: a rule
//! only complains about what it actually reached.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::events::Event;
use crate::geo::{haversine_km, point_in_ring};
use crate::params::TriggerParams;
use crate::types::Unit;

/// A deterministic, side-effect-free `(unit, event, params) → qualifies?` predicate.
pub trait TriggerRule: Sync {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError>;
}

impl<T: TriggerRule + ?Sized> TriggerRule for &T {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError> {
        (**self).evaluate(unit, event, params)
    }
}

fn required_threshold(params: &TriggerParams) -> Result<f64, PricingError> {
    params
        .threshold_or_m0()
        .ok_or_else(|| PricingError::configuration("params missing 'threshold' (and 'M0')"))
}

/// `value >= threshold (or M0)` and the event lies within `R_km` of the unit.
/// A distance of exactly `R_km` qualifies.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoRadiusThreshold;

impl TriggerRule for GeoRadiusThreshold {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError> {
        if event.value < required_threshold(params)? {
            return Ok(false);
        }
        let radius_km = params
            .radius_km
            .ok_or_else(|| PricingError::configuration("params missing 'R_km'"))?;
        let site = unit.point().ok_or_else(|| {
            PricingError::configuration(format!("unit '{}' missing 'lat'/'lon'", unit.id))
        })?;
        let epicentre = event
            .point
            .ok_or_else(|| PricingError::configuration("event missing 'lat'/'lon'"))?;
        Ok(haversine_km(site, epicentre) <= radius_km)
    }
}

/// `value >= threshold (or M0)` and the event point lies inside the unit polygon.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonContainsThreshold;

impl TriggerRule for PolygonContainsThreshold {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError> {
        let ring = match unit.polygon.as_deref() {
            Some(ring) if !ring.is_empty() => ring,
            Some(_) => {
                return Err(PricingError::configuration(format!(
                    "unit '{}' has an empty 'polygon'",
                    unit.id
                )));
            }
            None => {
                return Err(PricingError::configuration(format!(
                    "unit '{}' missing 'polygon' field",
                    unit.id
                )));
            }
        };
        if event.value < required_threshold(params)? {
            return Ok(false);
        }
        let p = event
            .point
            .ok_or_else(|| PricingError::configuration("event missing 'lat'/'lon'"))?;
        Ok(point_in_ring(p.lon, p.lat, ring))
    }
}

/// Non-geographic: `event.unit_id == unit.id` and `value >= threshold`.
///
/// Only `threshold` is accepted here; the earthquake `M0` alias is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexTimeSeriesThreshold;

impl TriggerRule for IndexTimeSeriesThreshold {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError> {
        if event.unit_id.as_deref() != Some(unit.id.as_str()) {
            return Ok(false);
        }
        let threshold = params
            .threshold
            .ok_or_else(|| PricingError::configuration("params missing 'threshold'"))?;
        Ok(event.value >= threshold)
    }
}

/// Closed registry of the built-in rules, addressable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    GeoRadiusThreshold,
    PolygonContainsThreshold,
    #[serde(rename = "index_timeseries_threshold")]
    IndexTimeSeriesThreshold,
}

impl TriggerKind {
    /// Sorted by name.
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::GeoRadiusThreshold,
        TriggerKind::IndexTimeSeriesThreshold,
        TriggerKind::PolygonContainsThreshold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TriggerKind::GeoRadiusThreshold => "geo_radius_threshold",
            TriggerKind::PolygonContainsThreshold => "polygon_contains_threshold",
            TriggerKind::IndexTimeSeriesThreshold => "index_timeseries_threshold",
        }
    }

    /// Look a rule up by registry name.
    pub fn from_name(name: &str) -> Result<Self, PricingError> {
        Self::ALL.into_iter().find(|k| k.name() == name).ok_or_else(|| {
            let available: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
            PricingError::configuration(format!(
                "unknown trigger rule '{name}'. Available: [{}]",
                available.join(", ")
            ))
        })
    }
}

impl TriggerRule for TriggerKind {
    fn evaluate(
        &self,
        unit: &Unit,
        event: &Event,
        params: &TriggerParams,
    ) -> Result<bool, PricingError> {
        match self {
            TriggerKind::GeoRadiusThreshold => GeoRadiusThreshold.evaluate(unit, event, params),
            TriggerKind::PolygonContainsThreshold => {
                PolygonContainsThreshold.evaluate(unit, event, params)
            }
            TriggerKind::IndexTimeSeriesThreshold => {
                IndexTimeSeriesThreshold.evaluate(unit, event, params)
            }
        }
    }
}

impl FromStr for TriggerKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
