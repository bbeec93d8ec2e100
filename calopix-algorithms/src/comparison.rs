//! Side-by-side comparison of every registered strategy on one event.
//!
//! Strategies run independently (concurrently when requested) and their
//! results are collected before anything is reported, so no strategy sees
//! another's output. Rows keep registration order.

use crate::StrategyRegistry;
use calopix_core::{
    EnergyPolicy, HitCloud, ObservableError, ObservableSet, ReducedCloud, ReductionError,
    ReductionStrategy,
};
use log::{debug, warn};
use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Width of the separator line under the table header.
const TABLE_WIDTH: usize = 160;

/// Why a strategy produced no observables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyFailure {
    /// The reduction itself failed.
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    /// The reduced cloud has undefined observables.
    #[error(transparent)]
    Observable(#[from] ObservableError),
}

/// Receives every reduced cloud produced during a comparison run.
pub trait CloudSink {
    /// Called once per successful strategy, in registration order.
    fn accept(&mut self, policy: EnergyPolicy, cloud: &ReducedCloud);
}

/// Sink that ignores every cloud.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink;

impl CloudSink for DiscardSink {
    fn accept(&mut self, _policy: EnergyPolicy, _cloud: &ReducedCloud) {}
}

/// One report row.
#[derive(Clone, Debug)]
pub struct ReportRow {
    /// Strategy name.
    pub strategy: String,
    /// Energy aggregation rule of the strategy.
    pub policy: EnergyPolicy,
    /// Observables, or the reason they are unavailable.
    pub outcome: Result<ObservableSet, StrategyFailure>,
    /// Wall time spent in the reduction.
    pub elapsed: Duration,
}

impl ReportRow {
    /// Whether the row's total energy satisfies its policy, or `None` for a failed row.
    pub fn policy_holds(&self, input_energy: f64) -> Option<bool> {
        self.outcome
            .as_ref()
            .ok()
            .map(|obs| self.policy.holds(input_energy, obs.total_energy))
    }
}

/// Result of a comparison run.
#[derive(Clone, Debug)]
pub struct ComparisonReport {
    input_hits: usize,
    input_energy: f64,
    rows: Vec<ReportRow>,
}

impl ComparisonReport {
    /// Number of hits in the input cloud.
    pub fn input_hits(&self) -> usize {
        self.input_hits
    }

    /// Total energy of the input cloud.
    pub fn input_energy(&self) -> f64 {
        self.input_energy
    }

    /// Rows in registration order.
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Row for the named strategy.
    pub fn row(&self, strategy: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.strategy == strategy)
    }

    /// Rows whose total energy breaks their declared policy.
    pub fn policy_violations(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows
            .iter()
            .filter(|r| r.policy_holds(self.input_energy) == Some(false))
    }

    /// Rows without observables.
    pub fn failures(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.outcome.is_err())
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<30} | {:>6} | {:>17} | {:>10} | {:>10} | {:>15} | {:>15} | {:>15} | {:>20}",
            "Strategy",
            "Points",
            "Energy Mean (GeV)",
            "Std Dev",
            "RMS",
            "Barycenter X",
            "Barycenter Y",
            "Barycenter Z",
            "Total Energy"
        )?;
        writeln!(f, "{:-<width$}", "", width = TABLE_WIDTH)?;
        for row in &self.rows {
            match &row.outcome {
                Ok(obs) => writeln!(
                    f,
                    "{:<30} | {:>6} | {:>17.5} | {:>10.5} | {:>10.5} | {:>15.6} | {:>15.6} | {:>15.6} | {:>20.10}",
                    row.strategy,
                    obs.count,
                    obs.energy_mean,
                    obs.energy_std,
                    obs.rms,
                    obs.barycenter.x,
                    obs.barycenter.y,
                    obs.barycenter.z,
                    obs.total_energy
                )?,
                Err(err) => writeln!(f, "{:<30} | failed: {err}", row.strategy)?,
            }
        }
        Ok(())
    }
}

fn run_one(
    strategy: &dyn ReductionStrategy,
    hits: &HitCloud,
) -> (Result<ReducedCloud, ReductionError>, Duration) {
    let start = Instant::now();
    let result = strategy.reduce(hits);
    (result, start.elapsed())
}

/// Runs every registered strategy on `hits` and computes its observables.
pub fn compare(hits: &HitCloud, registry: &StrategyRegistry, parallel: bool) -> ComparisonReport {
    compare_with_sink(hits, registry, parallel, &mut DiscardSink)
}

/// Like [`compare`], forwarding each reduced cloud to `sink` before computing
/// its observables.
pub fn compare_with_sink(
    hits: &HitCloud,
    registry: &StrategyRegistry,
    parallel: bool,
    sink: &mut dyn CloudSink,
) -> ComparisonReport {
    let strategies = registry.strategies();
    let results: Vec<_> = if parallel {
        strategies
            .par_iter()
            .map(|s| run_one(s.as_ref(), hits))
            .collect()
    } else {
        strategies.iter().map(|s| run_one(s.as_ref(), hits)).collect()
    };

    let rows = strategies
        .iter()
        .zip(results)
        .map(|(strategy, (result, elapsed))| {
            let name = strategy.name();
            let policy = strategy.energy_policy();
            let outcome = result.map_err(StrategyFailure::from).and_then(|cloud| {
                debug!(
                    "{name}: {} -> {} points in {elapsed:.2?}",
                    hits.len(),
                    cloud.len()
                );
                sink.accept(policy, &cloud);
                ObservableSet::compute(&cloud).map_err(StrategyFailure::from)
            });
            if let Err(err) = &outcome {
                warn!("{name}: {err}");
            }
            ReportRow {
                strategy: name,
                policy,
                outcome,
                elapsed,
            }
        })
        .collect();

    ComparisonReport {
        input_hits: hits.len(),
        input_energy: hits.total_energy(),
        rows,
    }
}
