use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::grid::BoundingBox;
use crate::params::RawParams;
use crate::sources::EventSourceConfig;
use crate::triggers::TriggerKind;

/// Where a run writes its results. Each target is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outputs {
    pub csv: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
    pub ndjson: Option<PathBuf>,
}

/// A parametric product: region, grid, trigger, pricing params and event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product: String,
    pub bbox: BoundingBox,
    /// Pixel side, degrees.
    pub grid_step: f64,
    pub time_start: String,
    pub time_end: String,
    pub trigger_rule: TriggerKind,
    pub pricing_params: RawParams,
    #[serde(alias = "fetcher")]
    pub event_source: EventSourceConfig,
    #[serde(default)]
    pub outputs: Outputs,
}

impl ProductConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| PipelineError::io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Built-in product: daily rainfall over Northern Italy on a quarter-degree
    /// grid, paying out when a gauge within 25 km records 100 mm or more.
    pub fn canonical() -> Self {
        let pricing_params: RawParams = [
            ("threshold", 100.0),
            ("R_km", 25.0),
            ("T_years", 1.0),
            ("L", 10_000.0),
            ("alpha", 0.2),
            ("T_hist_years", 20.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect();

        let mut source_params = serde_json::Map::new();
        source_params.insert("n_stations".into(), 40.into());
        source_params.insert("n_events".into(), 800.into());
        source_params.insert("seed".into(), 42.into());

        ProductConfig {
            product: "Rainfall excess - Northern Italy".to_string(),
            bbox: BoundingBox { min_lat: 44.0, max_lat: 47.0, min_lon: 7.0, max_lon: 13.0 },
            grid_step: 0.25,
            time_start: "2005-01-01".to_string(),
            time_end: "2025-01-01".to_string(),
            trigger_rule: TriggerKind::GeoRadiusThreshold,
            pricing_params,
            event_source: EventSourceConfig {
                name: "synthetic_rainfall".to_string(),
                params: source_params,
            },
            outputs: Outputs {
                csv: Some(PathBuf::from("premiums.csv")),
                geojson: Some(PathBuf::from("premiums.geojson")),
                ndjson: None,
            },
        }
    }
}
