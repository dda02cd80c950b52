use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace};

use crate::error::PricingError;
use crate::events::{self, Event, RawEvent};
use crate::params::{CoreParams, Params, RawParams, TriggerParams};
use crate::triggers::{TriggerKind, TriggerRule};
use crate::types::Unit;
use crate::validation;

/// The `{units, events, params}` payload.
///
/// Top-level keys are optional so that a payload missing one deserializes and
/// is then rejected by validation with a message naming the key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingInput {
    #[serde(default)]
    pub units: Option<Vec<Unit>>,
    #[serde(default)]
    pub events: Option<Vec<RawEvent>>,
    #[serde(default)]
    pub params: Option<RawParams>,
}

impl PricingInput {
    pub fn new(units: Vec<Unit>, events: Vec<RawEvent>, params: RawParams) -> Self {
        PricingInput { units: Some(units), events: Some(events), params: Some(params) }
    }
}

/// One priced unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    pub id: String,
    pub n_trigger_events: usize,
    pub lambda: f64,
    pub trigger_probability: f64,
    pub expected_loss: f64,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOutput {
    /// The params exactly as supplied.
    pub params_echo: RawParams,
    /// One entry per unit, in input order.
    pub results: Vec<UnitResult>,
}

/// Output of the Poisson frequency model for a single event count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub lambda: f64,
    pub trigger_probability: f64,
    pub expected_loss: f64,
    pub premium: f64,
}

/// Price `n` qualifying historical events under a homogeneous Poisson process.
///
/// lambda = n / T_hist_years
/// P(≥1 event in T_years) = 1 − exp(−lambda · T_years)
/// expected_loss = L · P, premium = expected_loss · (1 + alpha)
///
/// With no events, no coverage period or no payout the probability, loss and
/// premium are exactly zero rather than the result of an exponentiation.
///
/// The probability lies in `[0, 1)` mathematically, but saturates to exactly
/// `1.0` in `f64` once `lambda * T_years` exceeds about 37.
pub fn poisson_premium(n: usize, core: &CoreParams) -> Quote {
    let lambda = if n == 0 { 0.0 } else { n as f64 / core.t_hist_years };
    if n == 0 || core.t_years == 0.0 || core.loss == 0.0 {
        return Quote { lambda, trigger_probability: 0.0, expected_loss: 0.0, premium: 0.0 };
    }
    let trigger_probability = 1.0 - (-lambda * core.t_years).exp();
    let expected_loss = core.loss * trigger_probability;
    let premium = expected_loss * (1.0 + core.alpha);
    Quote { lambda, trigger_probability, expected_loss, premium }
}

/// Number of `events` for which `rule` qualifies against `unit`.
pub fn count_triggers<R: TriggerRule + ?Sized>(
    rule: &R,
    unit: &Unit,
    events: &[Event],
    params: &TriggerParams,
) -> Result<usize, PricingError> {
    let mut n = 0;
    for event in events {
        if rule.evaluate(unit, event, params)? {
            n += 1;
        }
    }
    Ok(n)
}

/// Validates, canonicalises and prices a payload with one trigger rule.
pub struct PricingEngine<R = TriggerKind> {
    rule: R,
    legacy: bool,
    parallel: bool,
}

impl PricingEngine<TriggerKind> {
    /// Default earthquake semantics: radius rule, `M0` and `R_km` mandatory.
    pub fn legacy() -> Self {
        PricingEngine { rule: TriggerKind::GeoRadiusThreshold, legacy: true, parallel: false }
    }

    /// A registry rule selected by name.
    pub fn named(name: &str) -> Result<Self, PricingError> {
        Ok(PricingEngine::with_rule(TriggerKind::from_name(name)?))
    }
}

impl<R: TriggerRule> PricingEngine<R> {
    /// A caller-supplied rule; only the financial params are mandatory.
    pub fn with_rule(rule: R) -> Self {
        PricingEngine { rule, legacy: false, parallel: false }
    }

    /// Spread units over the rayon pool. Output, including which error is
    /// reported, is identical to the sequential run.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, input: &PricingInput) -> Result<PricingOutput, PricingError> {
        validation::validate(input, self.legacy)?;

        // Validation guarantees all three are present.
        let (Some(units), Some(raw_events), Some(raw_params)) =
            (input.units.as_deref(), input.events.as_deref(), input.params.as_ref())
        else {
            return Err(PricingError::schema("incomplete pricing input"));
        };

        let span = info_span!(
            "pricing_run",
            units = units.len(),
            events = raw_events.len(),
            rule = std::any::type_name::<R>(),
        );
        let _enter = span.enter();

        let events = events::ingest(raw_events)?;
        let params = Params::from_raw(raw_params)?;
        debug!(?params, parallel = self.parallel, "inputs validated");

        let results: Vec<UnitResult> = if self.parallel {
            let rows: Vec<Result<UnitResult, PricingError>> =
                units.par_iter().map(|u| self.price_unit(u, &events, &params)).collect();
            rows.into_iter().collect::<Result<_, _>>()?
        } else {
            units
                .iter()
                .map(|u| self.price_unit(u, &events, &params))
                .collect::<Result<_, _>>()?
        };

        let priced = results.iter().filter(|r| r.premium > 0.0).count();
        info!(priced, zero = results.len() - priced, "pricing run complete");

        Ok(PricingOutput { params_echo: raw_params.clone(), results })
    }

    fn price_unit(
        &self,
        unit: &Unit,
        events: &[Event],
        params: &Params,
    ) -> Result<UnitResult, PricingError> {
        let n = count_triggers(&self.rule, unit, events, &params.trigger)?;
        let quote = poisson_premium(n, &params.core);
        trace!(unit = %unit.id, n, premium = quote.premium, "unit priced");
        Ok(UnitResult {
            id: unit.id.clone(),
            n_trigger_events: n,
            lambda: quote.lambda,
            trigger_probability: quote.trigger_probability,
            expected_loss: quote.expected_loss,
            premium: quote.premium,
        })
    }
}

/// Price with the default earthquake rule.
pub fn price(input: &PricingInput) -> Result<PricingOutput, PricingError> {
    PricingEngine::legacy().run(input)
}

/// Price with a caller-supplied rule.
pub fn price_with<R: TriggerRule>(
    input: &PricingInput,
    rule: R,
) -> Result<PricingOutput, PricingError> {
    PricingEngine::with_rule(rule).run(input)
}

/// Price with a registry rule looked up by name.
pub fn price_named(input: &PricingInput, name: &str) -> Result<PricingOutput, PricingError> {
    PricingEngine::named(name)?.run(input)
}
