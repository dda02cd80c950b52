//! Event sources: where a pipeline run gets its normalised events from.
//!
//! The pricing core never calls these. They exist so a product config can name
//! its event feed; both sources are local and deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{PipelineError, PricingError};
use crate::events::RawEvent;
use crate::geo::round_to;
use crate::grid::BoundingBox;

const DAYS_PER_YEAR: u32 = 365;

/// `{ "name": ..., "params": {...} }` as written in a product config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSourceConfig {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Deterministic daily-rainfall generator over a set of virtual gauges.
///
/// Gauges are scattered uniformly over the bounding box; each event picks a
/// gauge and a day uniformly and draws its total (mm) from an exponential
/// distribution. Same seed, same events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRainfall {
    pub bbox: BoundingBox,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default = "default_n_stations")]
    pub n_stations: usize,
    #[serde(default = "default_n_events")]
    pub n_events: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Mean daily total, mm.
    #[serde(default = "default_mean_mm")]
    pub mean_mm: f64,
}

fn default_n_stations() -> usize {
    40
}

fn default_n_events() -> usize {
    800
}

fn default_seed() -> u64 {
    42
}

fn default_mean_mm() -> f64 {
    50.0
}

impl SyntheticRainfall {
    pub fn new(bbox: BoundingBox, start_year: i32, end_year: i32) -> Self {
        SyntheticRainfall {
            bbox,
            start_year,
            end_year,
            n_stations: default_n_stations(),
            n_events: default_n_events(),
            seed: default_seed(),
            mean_mm: default_mean_mm(),
        }
    }

    /// Gauge positions, `(lat, lon)` rounded to 4 decimals.
    pub fn stations(&self, rng: &mut impl Rng) -> Vec<(f64, f64)> {
        (0..self.n_stations)
            .map(|_| {
                let lat = self.bbox.min_lat + rng.random::<f64>() * self.bbox.lat_span();
                let lon = self.bbox.min_lon + rng.random::<f64>() * self.bbox.lon_span();
                (round_to(lat, 4), round_to(lon, 4))
            })
            .collect()
    }

    pub fn generate(&self) -> Result<Vec<RawEvent>, PricingError> {
        if self.n_events > 0 && self.n_stations == 0 {
            return Err(PricingError::configuration("synthetic_rainfall needs n_stations > 0"));
        }
        let years = self.end_year - self.start_year;
        if years <= 0 {
            return Err(PricingError::configuration(format!(
                "synthetic_rainfall needs end year after start year, got {}..{}",
                self.start_year, self.end_year
            )));
        }
        let total_days = years as u32 * DAYS_PER_YEAR;
        let amount = Exp::new(1.0 / self.mean_mm).map_err(|e| {
            PricingError::configuration(format!("synthetic_rainfall mean_mm {}: {e}", self.mean_mm))
        })?;

        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        let stations = self.stations(&mut rng);

        let mut events = Vec::with_capacity(self.n_events);
        for _ in 0..self.n_events {
            let station_idx = rng.random_range(0..self.n_stations);
            let (lat, lon) = stations[station_idx];
            let day_offset = rng.random_range(0..total_days);
            let rainfall_mm = round_to(amount.sample(&mut rng), 1);

            events.push(RawEvent {
                kind: Some("rainfall".to_string()),
                time: Some(self.timestamp(day_offset)),
                lat: Some(lat),
                lon: Some(lon),
                value: Some(rainfall_mm),
                meta: Some(json!({
                    "unit": "mm",
                    "station_idx": station_idx,
                    "data_source": "synthetic",
                })),
                ..RawEvent::default()
            });
        }
        info!(events = events.len(), stations = self.n_stations, "generated synthetic rainfall");
        Ok(events)
    }

    /// Noon UTC on the `day_offset`-th day of the window, on a 12 × 30-day
    /// calendar clamped to real month lengths.
    fn timestamp(&self, day_offset: u32) -> String {
        let year = self.start_year + (day_offset / DAYS_PER_YEAR) as i32;
        let doy = day_offset % DAYS_PER_YEAR;
        let month = (doy / 30 + 1).min(12);
        let day = (doy % 30 + 1).min(28);
        format!("{year:04}-{month:02}-{day:02}T12:00:00Z")
    }
}

/// Leading `YYYY` of an ISO date.
fn year_of(date: &str, field: &str) -> Result<i32, PricingError> {
    date.get(..4)
        .and_then(|y| y.parse().ok())
        .ok_or_else(|| {
            PricingError::schema(format!("{field} must start with a 4-digit year, got '{date}'"))
        })
}

/// The registry of event sources a product config can name.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    SyntheticRainfall(SyntheticRainfall),
    /// A JSON array of events, or NDJSON when the extension is `.ndjson`/`.jsonl`.
    File(PathBuf),
}

impl EventSource {
    /// Sorted by name.
    pub const NAMES: [&'static str; 2] = ["file", "synthetic_rainfall"];

    pub fn from_config(
        config: &EventSourceConfig,
        bbox: &BoundingBox,
        time_start: &str,
        time_end: &str,
    ) -> Result<Self, PipelineError> {
        let params = serde_json::Value::Object(config.params.clone());
        match config.name.as_str() {
            "synthetic_rainfall" => {
                let start_year = year_of(time_start, "time_start")?;
                let end_year = year_of(time_end, "time_end")?;
                let mut settings = params;
                settings["bbox"] = serde_json::to_value(bbox)?;
                settings["start_year"] = json!(start_year);
                settings["end_year"] = json!(end_year);
                Ok(EventSource::SyntheticRainfall(serde_json::from_value(settings)?))
            }
            "file" => {
                #[derive(Deserialize)]
                struct FileParams {
                    path: PathBuf,
                }
                let FileParams { path } = serde_json::from_value(params)?;
                Ok(EventSource::File(path))
            }
            other => Err(PricingError::configuration(format!(
                "unknown event source '{other}'. Available: [{}]",
                Self::NAMES.join(", ")
            ))
            .into()),
        }
    }

    pub fn fetch(&self) -> Result<Vec<RawEvent>, PipelineError> {
        match self {
            EventSource::SyntheticRainfall(generator) => Ok(generator.generate()?),
            EventSource::File(path) => read_events(path),
        }
    }
}

fn read_events(path: &Path) -> Result<Vec<RawEvent>, PipelineError> {
    let text =
        fs::read_to_string(path).map_err(|e| PipelineError::io(path.display().to_string(), e))?;
    let line_delimited = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ndjson") | Some("jsonl")
    );
    let events = if line_delimited {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<RawEvent>, _>>()?
    } else {
        serde_json::from_str(&text)?
    };
    info!(events = events.len(), path = %path.display(), "loaded events");
    Ok(events)
}
