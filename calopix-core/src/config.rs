//! Strategy configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How grid binning maps a coordinate to a cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BinningMode {
    /// Truncate `coord / cell_size` toward zero. Cell 0 spans `(-cell_size, cell_size)`.
    #[default]
    Truncate,
    /// Floor `coord / cell_size`. Every cell spans exactly `cell_size`.
    Floor,
}

impl BinningMode {
    /// Cell index of `coord` for the given edge length.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_index(self, coord: f64, cell_size: f64) -> i64 {
        let q = coord / cell_size;
        match self {
            Self::Truncate => q.trunc() as i64,
            Self::Floor => q.floor() as i64,
        }
    }
}

/// Parameters for every registered reduction strategy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReductionConfig {
    /// Edge length of the fine grid-binning strategy.
    pub fine_cell_size: f64,
    /// Edge length of the coarse grid-binning strategy.
    pub coarse_cell_size: f64,
    /// Cell index rule used by both grid strategies.
    pub binning_mode: BinningMode,
    /// Number of clusters requested from both k-means variants.
    pub kmeans_clusters: usize,
    /// Independent k-means restarts; the lowest inertia wins.
    pub kmeans_restarts: usize,
    /// Maximum Lloyd iterations per restart.
    pub kmeans_max_iterations: usize,
    /// Convergence tolerance, relative to the mean feature variance.
    pub kmeans_tolerance: f64,
    /// Scale applied to the energy feature of the 4D k-means fit.
    pub kmeans_energy_weight: f64,
    /// Seed for randomized initialization. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Flat-kernel radius for mean-shift.
    pub mean_shift_bandwidth: f64,
    /// Maximum mean-shift iterations per seed.
    pub mean_shift_max_iterations: usize,
    /// DBSCAN neighbourhood radius.
    pub dbscan_epsilon: f64,
    /// Points (including itself) within epsilon for a point to be core.
    pub dbscan_min_points: usize,
    /// DBSCAN clusters smaller than this are demoted to noise.
    pub dbscan_min_cluster_size: usize,
    /// Run strategies concurrently.
    pub parallel: bool,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            fine_cell_size: 10.0,
            coarse_cell_size: 20.0,
            binning_mode: BinningMode::Truncate,
            kmeans_clusters: 150,
            kmeans_restarts: 10,
            kmeans_max_iterations: 300,
            kmeans_tolerance: 1e-4,
            kmeans_energy_weight: 1.0,
            seed: None,
            mean_shift_bandwidth: 30.0,
            mean_shift_max_iterations: 300,
            dbscan_epsilon: 30.0,
            dbscan_min_points: 1,
            dbscan_min_cluster_size: 1,
            parallel: true,
        }
    }
}

impl ReductionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both grid cell sizes.
    #[must_use]
    pub fn with_cell_sizes(mut self, fine: f64, coarse: f64) -> Self {
        self.fine_cell_size = fine;
        self.coarse_cell_size = coarse;
        self
    }

    /// Sets the binning mode.
    #[must_use]
    pub fn with_binning_mode(mut self, mode: BinningMode) -> Self {
        self.binning_mode = mode;
        self
    }

    /// Sets the k-means cluster count.
    #[must_use]
    pub fn with_kmeans_clusters(mut self, k: usize) -> Self {
        self.kmeans_clusters = k;
        self
    }

    /// Sets the k-means restart count.
    #[must_use]
    pub fn with_kmeans_restarts(mut self, restarts: usize) -> Self {
        self.kmeans_restarts = restarts;
        self
    }

    /// Sets the energy feature weight of the 4D k-means fit.
    #[must_use]
    pub fn with_kmeans_energy_weight(mut self, weight: f64) -> Self {
        self.kmeans_energy_weight = weight;
        self
    }

    /// Pins the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the mean-shift bandwidth.
    #[must_use]
    pub fn with_mean_shift_bandwidth(mut self, bandwidth: f64) -> Self {
        self.mean_shift_bandwidth = bandwidth;
        self
    }

    /// Sets DBSCAN epsilon and minimum points.
    #[must_use]
    pub fn with_dbscan(mut self, epsilon: f64, min_points: usize) -> Self {
        self.dbscan_epsilon = epsilon;
        self.dbscan_min_points = min_points;
        self
    }

    /// Sets whether strategies run concurrently.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks every parameter range.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("fine_cell_size", self.fine_cell_size),
            ("coarse_cell_size", self.coarse_cell_size),
            ("mean_shift_bandwidth", self.mean_shift_bandwidth),
            ("dbscan_epsilon", self.dbscan_epsilon),
            ("kmeans_energy_weight", self.kmeans_energy_weight),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.kmeans_tolerance.is_nan() || self.kmeans_tolerance < 0.0 {
            return Err(Error::ConfigError(format!(
                "kmeans_tolerance must be non-negative, got {}",
                self.kmeans_tolerance
            )));
        }
        let counts = [
            ("kmeans_clusters", self.kmeans_clusters),
            ("kmeans_restarts", self.kmeans_restarts),
            ("kmeans_max_iterations", self.kmeans_max_iterations),
            ("mean_shift_max_iterations", self.mean_shift_max_iterations),
            ("dbscan_min_points", self.dbscan_min_points),
            ("dbscan_min_cluster_size", self.dbscan_min_cluster_size),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(Error::ConfigError(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}
