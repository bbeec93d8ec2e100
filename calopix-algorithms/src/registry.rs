//! Ordered registry of reduction strategies.

use crate::{
    DbscanClustering, DbscanConfig, GridBinning, GridConfig, Identity, KMeansClustering,
    KMeansConfig, MeanShiftClustering, MeanShiftConfig,
};
use calopix_core::{EnergyPolicy, ReductionConfig, ReductionStrategy, Result};

/// Strategies in registration order.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ReductionStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard comparison line-up from `config`:
    /// identity, fine grid, k-means, k-means 4D, mean-shift, DBSCAN, coarse grid.
    ///
    /// # Errors
    /// Returns a configuration error if any parameter is out of range.
    pub fn from_config(config: &ReductionConfig) -> Result<Self> {
        config.validate()?;

        let kmeans = KMeansConfig {
            clusters: config.kmeans_clusters,
            restarts: config.kmeans_restarts,
            max_iterations: config.kmeans_max_iterations,
            tolerance: config.kmeans_tolerance,
            energy_weight: config.kmeans_energy_weight,
            seed: config.seed,
        };
        let grid = |cell_size| {
            GridBinning::new(GridConfig {
                cell_size,
                mode: config.binning_mode,
            })
        };

        let mut registry = Self::new();
        registry
            .register(Identity)
            .register(grid(config.fine_cell_size))
            .register(KMeansClustering::positions(kmeans.clone()))
            .register(KMeansClustering::positions_and_energy(kmeans))
            .register(MeanShiftClustering::new(MeanShiftConfig {
                bandwidth: config.mean_shift_bandwidth,
                max_iterations: config.mean_shift_max_iterations,
            }))
            .register(DbscanClustering::new(DbscanConfig {
                epsilon: config.dbscan_epsilon,
                min_points: config.dbscan_min_points,
                min_cluster_size: config.dbscan_min_cluster_size,
            }))
            .register(grid(config.coarse_cell_size));
        Ok(registry)
    }

    /// Appends a strategy.
    pub fn register<S: ReductionStrategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Registered strategies in order.
    pub fn strategies(&self) -> &[Box<dyn ReductionStrategy>] {
        &self.strategies
    }

    /// Strategy names in order.
    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// `(name, policy)` for every strategy in order.
    pub fn policies(&self) -> Vec<(String, EnergyPolicy)> {
        self.strategies
            .iter()
            .map(|s| (s.name(), s.energy_policy()))
            .collect()
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
