use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use paraprice::config::ProductConfig;
use paraprice::sources::EventSource;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ProductConfig::load(&path).with_context(|| format!("failed to load {path}"))?,
        None => ProductConfig::canonical(),
    };

    let source = EventSource::from_config(
        &config.event_source,
        &config.bbox,
        &config.time_start,
        &config.time_end,
    )?;
    let events = source.fetch().context("failed to fetch events")?;

    // Write NDJSON to stdout.
    let mut out = BufWriter::new(io::stdout().lock());
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }
    out.flush()?;

    // Per-station summary to stderr; events without a station index group as "-".
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut maxes: BTreeMap<String, f64> = BTreeMap::new();
    for e in &events {
        let station = e
            .meta
            .as_ref()
            .and_then(|m| m.get("station_idx"))
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let value = e.intensity().unwrap_or(0.0);
        *counts.entry(station.clone()).or_insert(0) += 1;
        *sums.entry(station.clone()).or_insert(0.0) += value;
        let cur = maxes.entry(station).or_insert(f64::NEG_INFINITY);
        if value > *cur {
            *cur = value;
        }
    }

    eprintln!(
        "event_catalog: {} events from '{}' over {} -> {}",
        events.len(),
        config.event_source.name,
        config.time_start,
        config.time_end
    );
    for (station, n) in &counts {
        let mean = sums[station] / *n as f64;
        let max = maxes[station];
        eprintln!("  station={station:<4}  events={n:>4}  mean={mean:.1}  max={max:.1}");
    }
    Ok(())
}
