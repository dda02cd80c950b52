use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::types::LatLon;

/// A hazard event as delivered by an upstream source.
///
/// Two shapes are accepted: the generic `{lat, lon, value, time}` and the legacy
/// earthquake `{lat, lon, magnitude, time}`. Every field is optional here so
/// that validation, not deserialization, decides what is missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Legacy alias of `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    /// Opaque to pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl RawEvent {
    /// Generic-shape event.
    pub fn generic(lat: f64, lon: f64, value: f64, time: impl Into<String>) -> Self {
        RawEvent {
            time: Some(time.into()),
            lat: Some(lat),
            lon: Some(lon),
            value: Some(value),
            ..RawEvent::default()
        }
    }

    /// Legacy earthquake-shape event.
    pub fn legacy(lat: f64, lon: f64, magnitude: f64, time: impl Into<String>) -> Self {
        RawEvent {
            time: Some(time.into()),
            lat: Some(lat),
            lon: Some(lon),
            magnitude: Some(magnitude),
            ..RawEvent::default()
        }
    }

    pub fn with_unit_id(mut self, unit_id: impl Into<String>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    /// `value`, falling back to `magnitude`.
    pub fn intensity(&self) -> Option<f64> {
        self.value.or(self.magnitude)
    }

    pub fn has_generic_shape(&self) -> bool {
        self.lat.is_some() && self.lon.is_some() && self.value.is_some() && self.time.is_some()
    }

    pub fn has_legacy_shape(&self) -> bool {
        self.lat.is_some() && self.lon.is_some() && self.magnitude.is_some() && self.time.is_some()
    }
}

/// Canonical event seen by trigger rules: the `value`/`magnitude` alias is
/// already resolved and the coordinates are collapsed into one optional point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub time: String,
    pub value: f64,
    pub point: Option<LatLon>,
    pub unit_id: Option<String>,
}

impl Event {
    /// Canonicalise the raw event at position `index` of the input.
    pub fn from_raw(index: usize, raw: &RawEvent) -> Result<Self, PricingError> {
        let value = raw.intensity().ok_or_else(|| {
            PricingError::configuration(format!(
                "events[{index}] has neither 'value' nor 'magnitude'"
            ))
        })?;
        let time = raw
            .time
            .clone()
            .ok_or_else(|| PricingError::schema(format!("events[{index}] missing 'time'")))?;
        let point = match (raw.lat, raw.lon) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
            _ => None,
        };
        Ok(Event { time, value, point, unit_id: raw.unit_id.clone() })
    }
}

/// Canonicalise a whole event list, failing on the first bad event.
pub fn ingest(raw: &[RawEvent]) -> Result<Vec<Event>, PricingError> {
    raw.iter().enumerate().map(|(i, e)| Event::from_raw(i, e)).collect()
}
