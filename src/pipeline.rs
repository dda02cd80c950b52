use tracing::info;

use crate::analysis::{self, Summary};
use crate::config::ProductConfig;
use crate::error::PipelineError;
use crate::grid::build_grid;
use crate::params;
use crate::pricing::{PricingEngine, PricingInput, PricingOutput};
use crate::sources::EventSource;
use crate::types::Unit;

/// Everything one product run produced, ready for the writers.
#[derive(Debug, Clone)]
pub struct ProductRun {
    pub units: Vec<Unit>,
    pub events_fetched: usize,
    /// Threshold used for the headline count: `threshold`, else `M0`, else 0.
    pub threshold: f64,
    pub events_at_or_above: usize,
    pub output: PricingOutput,
    pub summary: Summary,
}

/// Fetch events, build the grid and price every pixel for `config`.
pub fn run_product(config: &ProductConfig, parallel: bool) -> Result<ProductRun, PipelineError> {
    let source = EventSource::from_config(
        &config.event_source,
        &config.bbox,
        &config.time_start,
        &config.time_end,
    )?;
    let events = source.fetch()?;

    let pp = &config.pricing_params;
    let threshold = match params::number(pp, params::THRESHOLD)? {
        Some(t) => t,
        None => params::number(pp, params::M0)?.unwrap_or(0.0),
    };
    let events_at_or_above =
        events.iter().filter(|e| e.intensity().is_some_and(|v| v >= threshold)).count();

    let units = build_grid(&config.bbox, config.grid_step)?;
    info!(
        product = %config.product,
        pixels = units.len(),
        events = events.len(),
        rule = %config.trigger_rule,
        "product loaded"
    );

    let input = PricingInput::new(units, events, config.pricing_params.clone());
    let output = PricingEngine::with_rule(config.trigger_rule).parallel(parallel).run(&input)?;
    let summary = analysis::summarise(&output.results);

    let PricingInput { units, events, .. } = input;
    Ok(ProductRun {
        units: units.unwrap_or_default(),
        events_fetched: events.map_or(0, |e| e.len()),
        threshold,
        events_at_or_above,
        output,
        summary,
    })
}
