use crate::error::PricingError;
use crate::events::RawEvent;
use crate::params::{self, RawParams};
use crate::pricing::PricingInput;
use crate::types::Unit;

/// Financial params every run needs.
const PRICING_PARAMS: [&str; 4] =
    [params::T_YEARS, params::LOSS, params::ALPHA, params::T_HIST_YEARS];

/// Extra params the default (legacy earthquake) rule needs.
const LEGACY_PARAMS: [&str; 2] = [params::M0, params::R_KM];

/// Check `input` before any pricing runs. Fails on the first violation.
///
/// `legacy` is true when no rule was chosen and the default earthquake semantics
/// apply, in which case `M0` and `R_km` are mandatory too.
pub fn validate(input: &PricingInput, legacy: bool) -> Result<(), PricingError> {
    let units = input.units.as_deref().ok_or_else(|| PricingError::schema("missing 'units' key"))?;
    validate_units(units)?;

    let events =
        input.events.as_deref().ok_or_else(|| PricingError::schema("missing 'events' key"))?;
    validate_events(events)?;

    let params = input.params.as_ref().ok_or_else(|| PricingError::schema("missing 'params' key"))?;
    validate_params(params, legacy)
}

fn validate_units(units: &[Unit]) -> Result<(), PricingError> {
    if units.is_empty() {
        return Err(PricingError::schema("'units' must be a non-empty list"));
    }
    for (i, unit) in units.iter().enumerate() {
        if unit.id.is_empty() {
            return Err(PricingError::schema(format!("unit at index {i} missing 'id'")));
        }
    }
    Ok(())
}

fn validate_events(events: &[RawEvent]) -> Result<(), PricingError> {
    for (i, event) in events.iter().enumerate() {
        if !event.has_generic_shape() && !event.has_legacy_shape() {
            return Err(PricingError::schema(format!(
                "event at index {i} must have fields {{lat, lon, value, time}} (generic) \
                 or {{lat, lon, magnitude, time}} (legacy earthquake)"
            )));
        }
        let numeric = [
            ("lat", event.lat),
            ("lon", event.lon),
            ("value", event.value),
            ("magnitude", event.magnitude),
        ];
        for (name, value) in numeric {
            if let Some(v) = value {
                ensure_finite(v, &format!("events[{i}].{name}"))?;
            }
        }
    }
    Ok(())
}

fn validate_params(raw: &RawParams, legacy: bool) -> Result<(), PricingError> {
    let mut required: Vec<&str> = PRICING_PARAMS.to_vec();
    if legacy {
        required.extend(LEGACY_PARAMS);
    }
    let mut missing: Vec<&str> = required.into_iter().filter(|k| !raw.contains_key(*k)).collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(PricingError::schema(format!("missing params: {{{}}}", missing.join(", "))));
    }

    // Present, so `number` only fails on a non-numeric value.
    let read = |key: &str| params::number(raw, key).map(|v| v.unwrap_or_default());
    let t_years = read(params::T_YEARS)?;
    let loss = read(params::LOSS)?;
    let alpha = read(params::ALPHA)?;
    let t_hist_years = read(params::T_HIST_YEARS)?;

    if t_hist_years <= 0.0 {
        return Err(PricingError::range(params::T_HIST_YEARS, "must be > 0"));
    }
    if t_years < 0.0 {
        return Err(PricingError::range(params::T_YEARS, "must be >= 0"));
    }
    if loss < 0.0 {
        return Err(PricingError::range(params::LOSS, "must be >= 0"));
    }
    if alpha < 0.0 {
        return Err(PricingError::range(params::ALPHA, "must be >= 0"));
    }

    if params::number(raw, params::R_KM)?.is_some_and(|r_km| r_km < 0.0) {
        return Err(PricingError::range(params::R_KM, "must be >= 0"));
    }
    for key in [params::M0, params::THRESHOLD] {
        params::number(raw, key)?;
    }
    Ok(())
}

fn ensure_finite(value: f64, name: &str) -> Result<(), PricingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::range(name, format!("must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEvent;

    fn legacy_params() -> RawParams {
        [
            ("M0", 5.0),
            ("R_km", 100.0),
            ("T_years", 1.0),
            ("L", 1000.0),
            ("alpha", 0.2),
            ("T_hist_years", 30.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
    }

    fn input_with(params: RawParams) -> PricingInput {
        PricingInput::new(vec![Unit::at("u1", 0.0, 0.0)], vec![], params)
    }

    fn range_field(err: PricingError) -> String {
        match err {
            PricingError::Range { field, .. } => field,
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn valid_legacy_input_passes() {
        assert_eq!(validate(&input_with(legacy_params()), true), Ok(()));
    }

    #[test]
    fn missing_params_key_is_schema_error() {
        let input = PricingInput { params: None, ..input_with(legacy_params()) };
        let err = validate(&input, true).unwrap_err();
        assert_eq!(err, PricingError::schema("missing 'params' key"));
    }

    #[test]
    fn missing_units_key_is_schema_error() {
        let input = PricingInput { units: None, ..input_with(legacy_params()) };
        assert!(matches!(
            validate(&input, true),
            Err(PricingError::Schema(m)) if m.contains("units")
        ));
    }

    #[test]
    fn empty_units_rejected() {
        let input = PricingInput { units: Some(vec![]), ..input_with(legacy_params()) };
        assert!(matches!(validate(&input, true), Err(PricingError::Schema(_))));
    }

    #[test]
    fn unit_without_id_rejected_by_index() {
        let input = PricingInput {
            units: Some(vec![Unit::keyed("a"), Unit::default()]),
            ..input_with(legacy_params())
        };
        let err = validate(&input, true).unwrap_err();
        assert_eq!(err, PricingError::schema("unit at index 1 missing 'id'"));
    }

    #[test]
    fn empty_events_are_fine() {
        let input = input_with(legacy_params());
        assert!(validate(&input, true).is_ok());
    }

    #[test]
    fn event_with_neither_shape_rejected() {
        let mut input = input_with(legacy_params());
        input.events = Some(vec![RawEvent {
            lat: Some(1.0),
            lon: Some(1.0),
            time: Some("2020-01-01T00:00:00Z".into()),
            ..RawEvent::default()
        }]);
        assert!(matches!(
            validate(&input, true),
            Err(PricingError::Schema(m)) if m.contains("index 0")
        ));
    }

    #[test]
    fn non_finite_event_field_is_range_error() {
        let mut input = input_with(legacy_params());
        input.events = Some(vec![RawEvent::generic(f64::NAN, 0.0, 1.0, "t")]);
        assert_eq!(range_field(validate(&input, true).unwrap_err()), "events[0].lat");

        input.events = Some(vec![RawEvent::legacy(0.0, 0.0, f64::INFINITY, "t")]);
        assert_eq!(range_field(validate(&input, true).unwrap_err()), "events[0].magnitude");
    }

    #[test]
    fn legacy_mode_requires_m0_and_r_km() {
        let mut params = legacy_params();
        params.remove("M0");
        params.remove("R_km");
        let err = validate(&input_with(params.clone()), true).unwrap_err();
        assert_eq!(err, PricingError::schema("missing params: {M0, R_km}"));
        assert!(validate(&input_with(params), false).is_ok());
    }

    #[test]
    fn zero_t_hist_years_is_range_error() {
        let mut params = legacy_params();
        params.insert("T_hist_years".into(), 0.0.into());
        assert_eq!(range_field(validate(&input_with(params), true).unwrap_err()), "T_hist_years");
    }

    #[test]
    fn negative_bounds_rejected() {
        for key in ["T_years", "L", "alpha", "R_km"] {
            let mut params = legacy_params();
            params.insert(key.into(), (-0.1).into());
            assert_eq!(range_field(validate(&input_with(params), true).unwrap_err()), key);
        }
    }

    #[test]
    fn zero_t_years_and_loss_allowed() {
        let mut params = legacy_params();
        params.insert("T_years".into(), 0.0.into());
        params.insert("L".into(), 0.0.into());
        assert!(validate(&input_with(params), true).is_ok());
    }

    #[test]
    fn string_core_param_is_schema_error_naming_key() {
        let input: PricingInput = serde_json::from_str(
            r#"{
                "units": [{"id": "u1", "lat": 0, "lon": 0}],
                "events": [],
                "params": {"M0": 5, "R_km": 100, "T_years": "1", "L": 1000,
                           "alpha": 0.2, "T_hist_years": 30}
            }"#,
        )
        .unwrap();
        let err = validate(&input, true).unwrap_err();
        assert!(matches!(
            err,
            PricingError::Schema(m) if m.starts_with("params.T_years must be a number")
        ));
    }

    #[test]
    fn non_numeric_threshold_rejected() {
        let mut params = legacy_params();
        params.insert("threshold".into(), "high".into());
        assert!(matches!(
            validate(&input_with(params), false),
            Err(PricingError::Schema(m)) if m.starts_with("params.threshold")
        ));
    }

    #[test]
    fn unused_non_numeric_param_passes() {
        let mut params = legacy_params();
        params.insert("currency".into(), "EUR".into());
        assert!(validate(&input_with(params), true).is_ok());
    }
}
