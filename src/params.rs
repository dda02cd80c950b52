use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// The params mapping exactly as supplied; echoed back unchanged with the results.
///
/// Values stay as JSON so that keys pricing does not read (a currency code, a
/// product tag) pass through untouched.
pub type RawParams = BTreeMap<String, serde_json::Value>;

pub const T_HIST_YEARS: &str = "T_hist_years";
pub const T_YEARS: &str = "T_years";
pub const LOSS: &str = "L";
pub const ALPHA: &str = "alpha";
pub const THRESHOLD: &str = "threshold";
pub const M0: &str = "M0";
pub const R_KM: &str = "R_km";

/// Financial parameters common to every trigger kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreParams {
    /// Length of the historical observation window, years. > 0.
    pub t_hist_years: f64,
    /// Forward coverage period, years. >= 0.
    pub t_years: f64,
    /// Fixed payout per qualifying occurrence. >= 0.
    pub loss: f64,
    /// Proportional risk loading. >= 0.
    pub alpha: f64,
}

/// Trigger-specific parameters. Which ones are required depends on the rule,
/// so absence is only an error when a rule asks for the field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerParams {
    pub threshold: Option<f64>,
    /// Legacy earthquake name for the threshold.
    pub m0: Option<f64>,
    pub radius_km: Option<f64>,
}

impl TriggerParams {
    /// `threshold`, falling back to the legacy `M0`.
    pub fn threshold_or_m0(&self) -> Option<f64> {
        self.threshold.or(self.m0)
    }
}

/// Typed view over a validated [`RawParams`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub core: CoreParams,
    pub trigger: TriggerParams,
}

/// The numeric value under `key`, `None` when absent.
///
/// A present value that is not a JSON number is a schema error naming
/// `params.<key>`.
pub fn number(raw: &RawParams, key: &str) -> Result<Option<f64>, PricingError> {
    match raw.get(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            PricingError::schema(format!("params.{key} must be a number, got {value}"))
        }),
    }
}

impl Params {
    pub fn from_raw(raw: &RawParams) -> Result<Self, PricingError> {
        let required = |key: &str| {
            number(raw, key)?
                .ok_or_else(|| PricingError::schema(format!("missing params: {{{key}}}")))
        };
        Ok(Params {
            core: CoreParams {
                t_hist_years: required(T_HIST_YEARS)?,
                t_years: required(T_YEARS)?,
                loss: required(LOSS)?,
                alpha: required(ALPHA)?,
            },
            trigger: TriggerParams {
                threshold: number(raw, THRESHOLD)?,
                m0: number(raw, M0)?,
                radius_km: number(raw, R_KM)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, f64)]) -> RawParams {
        pairs.iter().map(|(k, v)| (k.to_string(), (*v).into())).collect()
    }

    #[test]
    fn from_raw_splits_core_and_trigger() {
        let p = Params::from_raw(&raw(&[
            ("T_hist_years", 30.0),
            ("T_years", 1.0),
            ("L", 1000.0),
            ("alpha", 0.2),
            ("M0", 5.5),
            ("R_km", 100.0),
        ]))
        .unwrap();
        assert_eq!(p.core.t_hist_years, 30.0);
        assert_eq!(p.core.loss, 1000.0);
        assert_eq!(p.trigger.threshold, None);
        assert_eq!(p.trigger.threshold_or_m0(), Some(5.5));
        assert_eq!(p.trigger.radius_km, Some(100.0));
    }

    #[test]
    fn threshold_takes_precedence_over_m0() {
        let t = TriggerParams { threshold: Some(100.0), m0: Some(5.0), radius_km: None };
        assert_eq!(t.threshold_or_m0(), Some(100.0));
    }

    #[test]
    fn missing_core_param_is_schema_error() {
        let err = Params::from_raw(&raw(&[("T_years", 1.0)])).unwrap_err();
        assert!(matches!(err, PricingError::Schema(_)));
    }

    #[test]
    fn string_valued_param_names_the_key() {
        let raw: RawParams = serde_json::from_str(
            r#"{"T_hist_years": 30, "T_years": "1", "L": 1000, "alpha": 0.2}"#,
        )
        .unwrap();
        let err = Params::from_raw(&raw).unwrap_err();
        assert!(matches!(
            err,
            PricingError::Schema(m) if m.starts_with("params.T_years must be a number")
        ));
    }

    #[test]
    fn integer_params_read_as_numbers() {
        let raw: RawParams = serde_json::from_str(
            r#"{"T_hist_years": 30, "T_years": 1, "L": 1000, "alpha": 0, "currency": "EUR"}"#,
        )
        .unwrap();
        let p = Params::from_raw(&raw).unwrap();
        assert_eq!((p.core.t_hist_years, p.core.alpha), (30.0, 0.0));
    }
}
