//! Parametric insurance pricing.
//!
//! Given insured units, historical events and pricing params, count the events
//! that trigger each unit under a pluggable rule and price the cover with a
//! Poisson frequency model. The [`pricing`] module is the core; the remaining
//! pipeline modules build grids, fetch events and write results around it.

pub mod analysis;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod grid;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod pricing;
pub mod sources;
pub mod triggers;
pub mod types;
pub mod validation;

pub use error::{PipelineError, PricingError};
pub use events::{Event, RawEvent};
pub use params::{CoreParams, Params, RawParams, TriggerParams};
pub use pricing::{
    PricingEngine, PricingInput, PricingOutput, Quote, UnitResult, poisson_premium, price,
    price_named, price_with,
};
pub use triggers::{
    GeoRadiusThreshold, IndexTimeSeriesThreshold, PolygonContainsThreshold, TriggerKind,
    TriggerRule,
};
pub use types::{LatLon, Unit};
