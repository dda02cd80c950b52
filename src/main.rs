use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use paraprice::PipelineError;
use paraprice::config::ProductConfig;
use paraprice::output;
use paraprice::pipeline::{self, ProductRun};

struct Args {
    config: Option<PathBuf>,
    csv: Option<PathBuf>,
    geojson: Option<PathBuf>,
    ndjson: Option<PathBuf>,
    parallel: bool,
    quiet: bool,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        csv: None,
        geojson: None,
        ndjson: None,
        parallel: false,
        quiet: false,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || -> Result<PathBuf> {
            i += 1;
            args.get(i).map(PathBuf::from).with_context(|| format!("{flag} requires a path"))
        };
        match flag {
            "--config" => parsed.config = Some(value()?),
            "--csv" => parsed.csv = Some(value()?),
            "--geojson" => parsed.geojson = Some(value()?),
            "--output" => parsed.ndjson = Some(value()?),
            "--parallel" => parsed.parallel = true,
            "--quiet" => parsed.quiet = true,
            other => bail!("unknown argument '{other}'"),
        }
        i += 1;
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let default_level = if args.quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ProductConfig::load(path)
            .with_context(|| format!("failed to load product config {}", path.display()))?,
        None => ProductConfig::canonical(),
    };
    if args.csv.is_some() {
        config.outputs.csv = args.csv;
    }
    if args.geojson.is_some() {
        config.outputs.geojson = args.geojson;
    }
    if args.ndjson.is_some() {
        config.outputs.ndjson = args.ndjson;
    }

    let run = pipeline::run_product(&config, args.parallel)
        .with_context(|| format!("pricing run for '{}' failed", config.product))?;

    if !args.quiet {
        print_summary(&config, &run);
    }

    if let Some(path) = &config.outputs.ndjson {
        write_file(path, |w| output::write_ndjson(w, &run.output.results))?;
        report(args.quiet, "NDJSON", path);
    }
    if let Some(path) = &config.outputs.csv {
        write_file(path, |w| output::write_csv(w, &run.output.results, &run.units))?;
        report(args.quiet, "CSV", path);
    }
    if let Some(path) = &config.outputs.geojson {
        write_file(path, |w| {
            output::write_geojson(w, &run.output.results, &run.units, config.grid_step)
        })?;
        report(args.quiet, "GeoJSON", path);
    }
    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), PipelineError>,
{
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush().with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn report(quiet: bool, kind: &str, path: &Path) {
    if !quiet {
        println!("Wrote {kind}: {}", path.display());
    }
}

fn print_summary(config: &ProductConfig, run: &ProductRun) {
    let b = &config.bbox;
    let s = &run.summary;
    println!("=== {} ===", config.product);
    println!(
        "Bbox: lat [{}, {}]  lon [{}, {}]  step {}°",
        b.min_lat, b.max_lat, b.min_lon, b.max_lon, config.grid_step
    );
    println!("Window: {} -> {}", config.time_start, config.time_end);
    println!("Trigger: {}", config.trigger_rule);

    println!("\n===== Summary =====");
    println!("Events fetched:             {}", run.events_fetched);
    println!("Events with value >= {:<6} {}", run.threshold, run.events_at_or_above);
    println!("Grid pixels:                {}", s.units);
    println!("Pixels with premium = 0:    {}  ({:.1}%)", s.zero_premium, s.pct_zero);
    println!("Pixels with premium > 0:    {}", s.nonzero_premium);
    if let (Some(min), Some(median), Some(max)) = (s.min, s.median, s.max) {
        println!("  Min premium:    {min:.4}");
        println!("  Median premium: {median:.4}");
        println!("  Max premium:    {max:.4}");
    }
    println!("===================");
}
