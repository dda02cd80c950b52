use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        LatLon { lat, lon }
    }
}

/// Polygon ring as `[lon, lat]` vertices; the first vertex repeats as the last.
pub type Ring = Vec<[f64; 2]>;

/// An independently priced exposure: a grid pixel, a named region, an index key.
///
/// A missing `id` deserializes to the empty string and is rejected by validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Ring>,
}

impl Unit {
    /// A point unit (grid pixel, site).
    pub fn at(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Unit { id: id.into(), lat: Some(lat), lon: Some(lon), polygon: None }
    }

    /// A non-geographic unit keyed by id only.
    pub fn keyed(id: impl Into<String>) -> Self {
        Unit { id: id.into(), ..Unit::default() }
    }

    /// A region unit bounded by `ring`.
    pub fn region(id: impl Into<String>, ring: Ring) -> Self {
        Unit { id: id.into(), polygon: Some(ring), ..Unit::default() }
    }

    /// Both coordinates, when the unit carries them.
    pub fn point(&self) -> Option<LatLon> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
            _ => None,
        }
    }
}
