//! Mean-shift mode seeking with a flat kernel.
//!
//! Every hit seeds a trajectory that repeatedly moves to the mean of the hits
//! within `bandwidth`. Converged modes are ranked by how many hits surround
//! them; a mode within `bandwidth` of a stronger one is dropped. Every hit is
//! then assigned to the nearest surviving mode, so the number of output
//! points is decided by the data.
#![allow(clippy::cast_precision_loss)]

use crate::extraction::ClusterAccumulator;
use crate::spatial::SpatialGrid;
use calopix_core::{
    EnergyPolicy, HitCloud, Position, ReducedCloud, ReductionError, ReductionStrategy,
};
use log::debug;
use rayon::prelude::*;

/// Trajectories stop once a step is shorter than this fraction of the bandwidth.
const STOP_FRACTION: f64 = 1e-3;

/// Mean-shift configuration.
#[derive(Clone, Debug)]
pub struct MeanShiftConfig {
    /// Kernel radius.
    pub bandwidth: f64,
    /// Maximum steps per seed.
    pub max_iterations: usize,
}

impl Default for MeanShiftConfig {
    fn default() -> Self {
        Self {
            bandwidth: 30.0,
            max_iterations: 300,
        }
    }
}

/// Mean-shift reduction strategy.
#[derive(Clone, Debug, Default)]
pub struct MeanShiftClustering {
    config: MeanShiftConfig,
}

impl MeanShiftClustering {
    /// Create with custom configuration.
    pub fn new(config: MeanShiftConfig) -> Self {
        Self { config }
    }

    /// Follows one seed to its mode. Returns the mode and the number of hits
    /// within bandwidth of the last visited mean.
    fn seek_mode(
        &self,
        seed: Position,
        grid: &SpatialGrid,
        positions: &[Position],
        neighbors: &mut Vec<usize>,
    ) -> Option<(Position, usize)> {
        let bandwidth = self.config.bandwidth;
        let stop = STOP_FRACTION * bandwidth;
        let mut mean = seed;
        let mut step = 0;
        loop {
            grid.within_radius_into(&mean, bandwidth, positions, neighbors);
            if neighbors.is_empty() {
                return None;
            }
            let previous = mean;
            mean = neighbors
                .iter()
                .fold(Position::ORIGIN, |acc, &j| acc + positions[j])
                / neighbors.len() as f64;
            step += 1;
            if mean.distance(&previous) <= stop || step >= self.config.max_iterations {
                return Some((mean, neighbors.len()));
            }
        }
    }

    /// Converged, de-duplicated modes ordered by decreasing intensity.
    ///
    /// # Errors
    /// Returns [`ReductionError`] if the bandwidth or iteration limit is invalid.
    pub fn modes(&self, hits: &HitCloud) -> Result<Vec<Position>, ReductionError> {
        let bandwidth = self.config.bandwidth;
        if bandwidth.is_nan() || bandwidth <= 0.0 {
            return Err(ReductionError::invalid(
                "mean-shift",
                "bandwidth",
                format!("must be positive, got {bandwidth}"),
            ));
        }
        if self.config.max_iterations == 0 {
            return Err(ReductionError::invalid(
                "mean-shift",
                "max_iterations",
                "must be at least 1",
            ));
        }

        let positions = hits.positions();
        let grid = SpatialGrid::from_positions(bandwidth, positions);
        let mut candidates: Vec<(Position, usize)> = positions
            .par_iter()
            .map_init(Vec::new, |neighbors, seed| {
                self.seek_mode(*seed, &grid, positions, neighbors)
            })
            .flatten()
            .collect();

        // Stable: equal intensities keep seed order.
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        let centers: Vec<Position> = candidates.into_iter().map(|(p, _)| p).collect();

        let center_grid = SpatialGrid::from_positions(bandwidth, &centers);
        let mut keep = vec![true; centers.len()];
        let mut nearby = Vec::new();
        for i in 0..centers.len() {
            if !keep[i] {
                continue;
            }
            center_grid.within_radius_into(&centers[i], bandwidth, &centers, &mut nearby);
            for &j in &nearby {
                if j != i {
                    keep[j] = false;
                }
            }
        }

        let modes: Vec<Position> = centers
            .into_iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(p))
            .collect();
        debug!(
            "mean-shift {bandwidth}: {} hits converged to {} modes",
            positions.len(),
            modes.len()
        );
        Ok(modes)
    }
}

impl ReductionStrategy for MeanShiftClustering {
    fn name(&self) -> String {
        format!("MeanShift clustering (bandwidth={})", self.config.bandwidth)
    }

    fn energy_policy(&self) -> EnergyPolicy {
        EnergyPolicy::Sum
    }

    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError> {
        let modes = self.modes(hits)?;
        if modes.is_empty() {
            return Ok(ReducedCloud::new(self.name()));
        }

        let nearest: Vec<usize> = hits
            .positions()
            .par_iter()
            .map(|p| {
                modes
                    .iter()
                    .map(|m| m.distance_squared(p))
                    .enumerate()
                    .fold((0, f64::INFINITY), |acc, (j, d)| if d < acc.1 { (j, d) } else { acc })
                    .0
            })
            .collect();

        let mut members = vec![ClusterAccumulator::default(); modes.len()];
        for ((p, energy), &j) in hits.iter().zip(&nearest) {
            members[j].add(p, energy);
        }

        let mut reduced = ReducedCloud::with_capacity(self.name(), modes.len());
        for (mode, acc) in modes.iter().zip(&members) {
            if !acc.is_empty() {
                reduced.push(*mode, acc.energy_sum());
            }
        }
        Ok(reduced)
    }
}
