use paraprice::config::ProductConfig;
use paraprice::events::RawEvent;
use paraprice::grid::{BoundingBox, build_grid};
use paraprice::params::RawParams;
use paraprice::pricing::PricingInput;
use paraprice::sources::SyntheticRainfall;

pub struct Scenario {
    pub grid_step: f64,
    pub n_stations: usize,
    pub n_events: usize,
}

pub const SMALL: Scenario = Scenario { grid_step: 0.5, n_stations: 20, n_events: 200 };

pub const MEDIUM: Scenario = Scenario { grid_step: 0.25, n_stations: 40, n_events: 800 };

pub const LARGE: Scenario = Scenario { grid_step: 0.1, n_stations: 100, n_events: 4_000 };

pub fn northern_italy() -> BoundingBox {
    ProductConfig::canonical().bbox
}

pub fn rainfall_params() -> RawParams {
    ProductConfig::canonical().pricing_params
}

pub fn make_events(scenario: &Scenario) -> Vec<RawEvent> {
    let generator = SyntheticRainfall {
        n_stations: scenario.n_stations,
        n_events: scenario.n_events,
        ..SyntheticRainfall::new(northern_italy(), 2005, 2025)
    };
    generator.generate().expect("synthetic events")
}

/// Grid, events and params for one scenario, ready to price.
pub fn build_input(scenario: &Scenario) -> PricingInput {
    let units = build_grid(&northern_italy(), scenario.grid_step).expect("grid");
    PricingInput::new(units, make_events(scenario), rainfall_params())
}
