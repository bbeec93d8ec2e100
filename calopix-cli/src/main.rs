//! calopix: compare hit-cloud reduction strategies on one event.
//!
//! Reads a structured event file, runs every registered strategy on the
//! selected event and prints the observables side by side.

use calopix_algorithms::{compare_with_sink, CloudSink, StrategyRegistry};
use calopix_core::{EnergyPolicy, ReducedCloud, ReductionConfig};
use calopix_io::{DatasetSummary, EventFileReader};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    CalopixIo(#[from] calopix_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] calopix_core::Error),

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Compare point-cloud reduction strategies on one calorimeter event.
#[derive(Parser)]
#[command(name = "calopix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Event file (.json, or .h5/.hdf5 with the `hdf5` feature)
    #[arg(value_name = "EVENT_FILE")]
    input: PathBuf,

    /// JSON file overriding strategy parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for k-means initialization (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Index of the event to reduce
    #[arg(short, long, default_value = "0")]
    event: usize,

    /// Run strategies one after another instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Logs a one-line description of every reduced cloud.
struct LoggingSink;

impl CloudSink for LoggingSink {
    fn accept(&mut self, policy: EnergyPolicy, cloud: &ReducedCloud) {
        match cloud.energy_range() {
            Some((lo, hi)) => info!(
                "{}: {} points, energy {lo:.3e}..{hi:.3e} GeV ({policy})",
                cloud.name(),
                cloud.len()
            ),
            None => info!("{}: empty ({policy})", cloud.name()),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReductionConfig> {
    let Some(path) = path else {
        return Ok(ReductionConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.sequential {
        config.parallel = false;
    }
    let registry = StrategyRegistry::from_config(&config)?;

    let start = Instant::now();
    let data = EventFileReader::open(&cli.input)?.read()?;
    info!(
        "Read {} in {:.2}s",
        cli.input.display(),
        start.elapsed().as_secs_f64()
    );
    println!("{}", DatasetSummary::from_events(&data));

    let hits = data.event(cli.event)?;
    println!();
    println!(
        "Event {}: {} hits, total energy {:.10} GeV",
        cli.event,
        hits.len(),
        hits.total_energy()
    );
    println!();

    let start = Instant::now();
    let report = if cli.verbose {
        compare_with_sink(&hits, &registry, config.parallel, &mut LoggingSink)
    } else {
        calopix_algorithms::compare(&hits, &registry, config.parallel)
    };
    info!(
        "Ran {} strategies in {:.2}s",
        registry.len(),
        start.elapsed().as_secs_f64()
    );

    print!("{report}");

    for row in report.policy_violations() {
        warn!(
            "{}: total energy breaks its `{}` policy",
            row.strategy, row.policy
        );
    }

    Ok(())
}
