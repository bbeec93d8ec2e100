//! Density-based clustering (DBSCAN) in 3D.
//!
//! Hits that are not density-reachable from any core hit are labeled noise
//! and their energy is excluded from the reduced cloud.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::extraction::{extract_clusters, EnergyAggregation, NOISE};
use crate::spatial::SpatialGrid;
use calopix_core::{
    EnergyPolicy, HitCloud, Position, ReducedCloud, ReductionError, ReductionStrategy,
};
use log::debug;

/// DBSCAN configuration.
#[derive(Clone, Debug)]
pub struct DbscanConfig {
    /// Neighbourhood radius.
    pub epsilon: f64,
    /// Hits within epsilon, counting the hit itself, needed to be core.
    pub min_points: usize,
    /// Clusters with fewer hits are demoted to noise.
    pub min_cluster_size: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            epsilon: 30.0,
            min_points: 1,
            min_cluster_size: 1,
        }
    }
}

/// Reusable buffers for DBSCAN runs.
#[derive(Default)]
pub struct DbscanState {
    visited: Vec<bool>,
    noise: Vec<bool>,
    neighbors: Vec<usize>,
    seeds: Vec<usize>,
    cluster_sizes: Vec<usize>,
    id_map: Vec<i32>,
}

struct DbscanContext<'a> {
    grid: &'a SpatialGrid,
    positions: &'a [Position],
    epsilon: f64,
}

/// Mutable tracking state used during DBSCAN clustering.
struct TrackingState<'a> {
    visited: &'a mut [bool],
    noise: &'a mut [bool],
}

/// DBSCAN reduction strategy.
#[derive(Clone, Debug, Default)]
pub struct DbscanClustering {
    config: DbscanConfig,
}

impl DbscanClustering {
    /// Create with custom configuration.
    pub fn new(config: DbscanConfig) -> Self {
        Self { config }
    }

    /// Create a fresh state.
    pub fn create_state(&self) -> DbscanState {
        DbscanState::default()
    }

    fn validate(&self) -> Result<(), ReductionError> {
        let eps = self.config.epsilon;
        if eps.is_nan() || eps <= 0.0 {
            return Err(ReductionError::invalid(
                "dbscan",
                "epsilon",
                format!("must be positive, got {eps}"),
            ));
        }
        if self.config.min_points == 0 {
            return Err(ReductionError::invalid("dbscan", "min_points", "must be at least 1"));
        }
        if self.config.min_cluster_size == 0 {
            return Err(ReductionError::invalid(
                "dbscan",
                "min_cluster_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Labels every hit with a cluster id or [`NOISE`] and returns the number
    /// of clusters.
    ///
    /// # Errors
    /// Returns [`ReductionError`] if the configuration is invalid.
    pub fn cluster(
        &self,
        hits: &HitCloud,
        state: &mut DbscanState,
        labels: &mut Vec<i32>,
    ) -> Result<usize, ReductionError> {
        self.validate()?;
        let n = hits.len();
        labels.clear();
        labels.resize(n, NOISE);
        if n == 0 {
            return Ok(0);
        }

        let positions = hits.positions();
        let grid = SpatialGrid::from_positions(self.config.epsilon, positions);
        let ctx = DbscanContext {
            grid: &grid,
            positions,
            epsilon: self.config.epsilon,
        };

        if state.visited.len() < n {
            state.visited.resize(n, false);
            state.noise.resize(n, false);
        }
        state.visited[..n].fill(false);
        state.noise[..n].fill(false);

        let mut tracking = TrackingState {
            visited: &mut state.visited[..n],
            noise: &mut state.noise[..n],
        };
        let neighbors = &mut state.neighbors;
        let seeds = &mut state.seeds;

        let mut current_cluster_id = 0;
        for i in 0..n {
            if tracking.visited[i] {
                continue;
            }
            tracking.visited[i] = true;

            ctx.grid.within_radius_into(
                &ctx.positions[i],
                ctx.epsilon,
                ctx.positions,
                neighbors,
            );

            if neighbors.len() < self.config.min_points {
                tracking.noise[i] = true;
            } else {
                labels[i] = current_cluster_id;
                seeds.clear();
                claim_neighbors(neighbors, seeds, current_cluster_id, labels, &mut tracking);
                self.expand_cluster(
                    &ctx,
                    seeds,
                    current_cluster_id,
                    labels,
                    &mut tracking,
                    neighbors,
                );
                current_cluster_id += 1;
            }
        }

        // Post-processing: Filter clusters smaller than min_cluster_size
        if self.config.min_cluster_size > 1 && current_cluster_id > 0 {
            let cluster_count = current_cluster_id as usize;
            state.cluster_sizes.clear();
            state.cluster_sizes.resize(cluster_count, 0);
            for &id in labels.iter() {
                if id >= 0 {
                    state.cluster_sizes[id as usize] += 1;
                }
            }

            state.id_map.clear();
            state.id_map.resize(cluster_count, NOISE);
            let mut kept = 0;
            for (old_id, &size) in state.cluster_sizes.iter().enumerate() {
                if size >= self.config.min_cluster_size {
                    state.id_map[old_id] = kept;
                    kept += 1;
                }
            }

            for id in labels.iter_mut() {
                if *id >= 0 {
                    *id = state.id_map[*id as usize];
                }
            }
            current_cluster_id = kept;
        }

        Ok(current_cluster_id as usize)
    }

    fn expand_cluster(
        &self,
        ctx: &DbscanContext,
        seeds: &mut Vec<usize>,
        cluster_id: i32,
        labels: &mut [i32],
        tracking: &mut TrackingState,
        neighbors: &mut Vec<usize>,
    ) {
        let mut i = 0;
        while i < seeds.len() {
            let current = seeds[i];
            i += 1;

            ctx.grid.within_radius_into(
                &ctx.positions[current],
                ctx.epsilon,
                ctx.positions,
                neighbors,
            );
            if neighbors.len() >= self.config.min_points {
                claim_neighbors(neighbors, seeds, cluster_id, labels, tracking);
            }
        }
    }
}

/// Gives unclaimed neighbours to `cluster_id`. Unvisited hits are queued for
/// expansion, so every hit enters `seeds` at most once; noise hits become
/// border hits and are not expanded.
fn claim_neighbors(
    neighbors: &[usize],
    seeds: &mut Vec<usize>,
    cluster_id: i32,
    labels: &mut [i32],
    tracking: &mut TrackingState,
) {
    for &j in neighbors {
        if !tracking.visited[j] {
            tracking.visited[j] = true;
            labels[j] = cluster_id;
            seeds.push(j);
        } else if tracking.noise[j] {
            tracking.noise[j] = false;
            labels[j] = cluster_id;
        }
    }
}

impl ReductionStrategy for DbscanClustering {
    fn name(&self) -> String {
        format!(
            "DBSCAN clustering (eps={}, min_samples={})",
            self.config.epsilon, self.config.min_points
        )
    }

    fn energy_policy(&self) -> EnergyPolicy {
        EnergyPolicy::DropNoise
    }

    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError> {
        let mut state = self.create_state();
        let mut labels = Vec::with_capacity(hits.len());
        let clusters = self.cluster(hits, &mut state, &mut labels)?;

        let reduced = extract_clusters(
            self.name(),
            hits,
            &labels,
            clusters,
            EnergyAggregation::Sum,
        );
        let noise = labels.iter().filter(|&&l| l == NOISE).count();
        debug!(
            "dbscan: {clusters} clusters, {noise} noise hits, {:.6} energy dropped",
            hits.total_energy() - reduced.total_energy()
        );
        Ok(reduced)
    }
}
