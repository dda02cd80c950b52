use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::geo::round_to;
use crate::types::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn centre(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

fn round6(x: f64) -> f64 {
    round_to(x, 6)
}

/// Regular pixel grid over `bbox`, one unit per cell centre.
///
/// Cells are laid out row by row from the south-west corner and named
/// `px_000000`, `px_000001`, …; a partial cell at the north or east edge is kept
/// when its centre still falls inside the box.
pub fn build_grid(bbox: &BoundingBox, step: f64) -> Result<Vec<Unit>, PricingError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(PricingError::range("grid_step", format!("must be finite and > 0, got {step}")));
    }
    let half = step / 2.0;
    let rows = ((bbox.lat_span() - half) / step).ceil().max(0.0) as usize;
    let cols = ((bbox.lon_span() - half) / step).ceil().max(0.0) as usize;

    let mut units = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        let lat = bbox.min_lat + half + r as f64 * step;
        for c in 0..cols {
            let lon = bbox.min_lon + half + c as f64 * step;
            units.push(Unit::at(format!("px_{:06}", units.len()), round6(lat), round6(lon)));
        }
    }
    Ok(units)
}

/// The `[lon, lat]` ring of the square pixel centred on `(lat, lon)`.
pub fn pixel_ring(lat: f64, lon: f64, step: f64) -> Vec<[f64; 2]> {
    let half = step / 2.0;
    vec![
        [round6(lon - half), round6(lat - half)],
        [round6(lon + half), round6(lat - half)],
        [round6(lon + half), round6(lat + half)],
        [round6(lon - half), round6(lat + half)],
        [round6(lon - half), round6(lat - half)],
    ]
}
