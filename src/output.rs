//! Result writers. Each takes the priced results plus the units they came from;
//! coordinates are looked up by unit id, results are never modified.

use std::collections::HashMap;
use std::io::Write;

use serde_json::json;

use crate::error::{PipelineError, PricingError};
use crate::geo::round_to;
use crate::grid::pixel_ring;
use crate::pricing::UnitResult;
use crate::types::{LatLon, Unit};

pub const CSV_HEADER: &str =
    "id,lat,lon,n_trigger_events,lambda,trigger_probability,expected_loss,premium";

struct UnitLookup<'a>(HashMap<&'a str, &'a Unit>);

impl<'a> UnitLookup<'a> {
    fn new(units: &'a [Unit]) -> Self {
        UnitLookup(units.iter().map(|u| (u.id.as_str(), u)).collect())
    }

    fn point(&self, id: &str) -> Result<LatLon, PricingError> {
        self.0
            .get(id)
            .and_then(|u| u.point())
            .ok_or_else(|| {
                PricingError::schema(format!("result '{id}' has no unit with 'lat'/'lon'"))
            })
    }
}

/// One JSON result per line.
pub fn write_ndjson<W: Write>(mut out: W, results: &[UnitResult]) -> Result<(), PipelineError> {
    for r in results {
        serde_json::to_writer(&mut out, r)?;
        out.write_all(b"\n").map_err(|e| PipelineError::io("ndjson output", e))?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(
    mut out: W,
    results: &[UnitResult],
    units: &[Unit],
) -> Result<(), PipelineError> {
    let lookup = UnitLookup::new(units);
    let io = |e| PipelineError::io("csv output", e);
    writeln!(out, "{CSV_HEADER}").map_err(io)?;
    for r in results {
        let p = lookup.point(&r.id)?;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            csv_field(&r.id),
            p.lat,
            p.lon,
            r.n_trigger_events,
            r.lambda,
            r.trigger_probability,
            r.expected_loss,
            r.premium
        )
        .map_err(io)?;
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// FeatureCollection of square pixels of side `grid_step`, one per result.
pub fn geojson(
    results: &[UnitResult],
    units: &[Unit],
    grid_step: f64,
) -> Result<serde_json::Value, PricingError> {
    let lookup = UnitLookup::new(units);
    let features = results
        .iter()
        .map(|r| {
            let p = lookup.point(&r.id)?;
            Ok(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [pixel_ring(p.lat, p.lon, grid_step)],
                },
                "properties": {
                    "id": r.id,
                    "premium": round_to(r.premium, 6),
                    "lambda": round_to(r.lambda, 8),
                    "trigger_probability": round_to(r.trigger_probability, 8),
                    "n_trigger_events": r.n_trigger_events,
                    "expected_loss": round_to(r.expected_loss, 6),
                },
            }))
        })
        .collect::<Result<Vec<_>, PricingError>>()?;
    Ok(json!({ "type": "FeatureCollection", "features": features }))
}

pub fn write_geojson<W: Write>(
    out: W,
    results: &[UnitResult],
    units: &[Unit],
    grid_step: f64,
) -> Result<(), PipelineError> {
    serde_json::to_writer(out, &geojson(results, units, grid_step)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<UnitResult>, Vec<Unit>) {
        let units = vec![Unit::at("px_000000", 44.5, 7.5), Unit::at("px_000001", 44.5, 8.5)];
        let results = vec![
            UnitResult {
                id: "px_000000".into(),
                n_trigger_events: 0,
                lambda: 0.0,
                trigger_probability: 0.0,
                expected_loss: 0.0,
                premium: 0.0,
            },
            UnitResult {
                id: "px_000001".into(),
                n_trigger_events: 1,
                lambda: 1.0 / 30.0,
                trigger_probability: 0.032_783_899_517_821_7,
                expected_loss: 32.783_899_517_821_7,
                premium: 39.340_679_421_386_04,
            },
        ];
        (results, units)
    }

    #[test]
    fn ndjson_one_line_per_result() {
        let (results, _) = fixture();
        let mut buf = Vec::new();
        write_ndjson(&mut buf, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: UnitResult = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back, results[1]);
    }

    #[test]
    fn csv_has_header_and_coordinates() {
        let (results, units) = fixture();
        let mut buf = Vec::new();
        write_csv(&mut buf, &results, &units).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.next(), Some("px_000000,44.5,7.5,0,0,0,0,0"));
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row.len(), 8);
        assert_eq!(&row[..4], &["px_000001", "44.5", "8.5", "1"]);
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_quotes_awkward_ids() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn geojson_pixels_and_rounded_properties() {
        let (results, units) = fixture();
        let fc = geojson(&results, &units, 1.0).unwrap();
        assert_eq!(fc["type"], "FeatureCollection");
        let features = fc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let ring = &features[1]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 5);
        assert_eq!(ring[0], json!([8.0, 44.0]));
        assert_eq!(ring[2], json!([9.0, 45.0]));

        let props = &features[1]["properties"];
        assert_eq!(props["id"], "px_000001");
        assert_eq!(props["n_trigger_events"], 1);
        assert_eq!(props["premium"], 39.340679);
        assert_eq!(props["lambda"], 0.03333333);
        assert_eq!(props["trigger_probability"], 0.0327839);
        assert_eq!(props["expected_loss"], 32.7839);
    }

    #[test]
    fn writers_leave_results_untouched() {
        let (results, units) = fixture();
        let before = results.clone();
        write_geojson(Vec::new(), &results, &units, 1.0).unwrap();
        write_csv(Vec::new(), &results, &units).unwrap();
        assert_eq!(results, before);
    }

    #[test]
    fn result_without_located_unit_is_rejected() {
        let (results, _) = fixture();
        let units = vec![Unit::at("px_000000", 44.5, 7.5), Unit::keyed("px_000001")];
        let err = geojson(&results, &units, 1.0).unwrap_err();
        assert!(matches!(err, PricingError::Schema(m) if m.contains("px_000001")));
    }
}
