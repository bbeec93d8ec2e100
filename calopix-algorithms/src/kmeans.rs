//! K-means clustering in position space or joint position-energy space.
//!
//! Initial centroids are `k` distinct hits drawn uniformly at random. The fit
//! is restarted `restarts` times and the run with the lowest inertia wins.
//! Without a pinned seed the initialization comes from OS entropy, so cluster
//! assignments (and with them the 4D energy aggregate) are only statistically
//! stable from run to run.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::extraction::{extract_clusters, EnergyAggregation};
use calopix_core::{EnergyPolicy, HitCloud, ReducedCloud, ReductionError, ReductionStrategy};
use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Which coordinates the clustering runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureSpace {
    /// `(x, y, z)`. Output energy is the member sum.
    Position,
    /// `(x, y, z, energy)`. Output energy is the member mean.
    PositionEnergy,
}

impl FeatureSpace {
    fn dim(self) -> usize {
        match self {
            Self::Position => 3,
            Self::PositionEnergy => 4,
        }
    }
}

/// K-means configuration.
#[derive(Clone, Debug)]
pub struct KMeansConfig {
    /// Requested number of clusters. Capped at the number of hits.
    pub clusters: usize,
    /// Independent restarts.
    pub restarts: usize,
    /// Maximum Lloyd iterations per restart.
    pub max_iterations: usize,
    /// Stop when the squared centroid shift falls below this fraction of the
    /// mean feature variance.
    pub tolerance: f64,
    /// Scale of the energy feature in [`FeatureSpace::PositionEnergy`].
    pub energy_weight: f64,
    /// Random seed; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            clusters: 150,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            energy_weight: 1.0,
            seed: None,
        }
    }
}

/// Result of a k-means fit.
#[derive(Clone, Debug)]
pub struct KMeansFit {
    /// Cluster index of every point.
    pub labels: Vec<i32>,
    /// Flattened centroids, `dim` values each.
    pub centroids: Vec<f64>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning restart.
    pub iterations: usize,
}

/// K-means reduction strategy.
#[derive(Clone, Debug)]
pub struct KMeansClustering {
    config: KMeansConfig,
    space: FeatureSpace,
}

impl KMeansClustering {
    /// Create a strategy clustering in `space`.
    pub fn new(config: KMeansConfig, space: FeatureSpace) -> Self {
        Self { config, space }
    }

    /// K-means on hit positions, energies summed per cluster.
    pub fn positions(config: KMeansConfig) -> Self {
        Self::new(config, FeatureSpace::Position)
    }

    /// K-means on positions and energy, energies averaged per cluster.
    pub fn positions_and_energy(config: KMeansConfig) -> Self {
        Self::new(config, FeatureSpace::PositionEnergy)
    }

    /// Feature space of this strategy.
    pub fn feature_space(&self) -> FeatureSpace {
        self.space
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn features(&self, hits: &HitCloud) -> Vec<f64> {
        let mut features = Vec::with_capacity(hits.len() * self.space.dim());
        for (p, energy) in hits.iter() {
            features.extend_from_slice(&p.to_array());
            if self.space == FeatureSpace::PositionEnergy {
                features.push(energy * self.config.energy_weight);
            }
        }
        features
    }

    fn validate(&self) -> Result<(), ReductionError> {
        let c = &self.config;
        if c.clusters == 0 {
            return Err(ReductionError::invalid("k-means", "clusters", "must be at least 1"));
        }
        if c.restarts == 0 {
            return Err(ReductionError::invalid("k-means", "restarts", "must be at least 1"));
        }
        if c.tolerance.is_nan() || c.tolerance < 0.0 {
            return Err(ReductionError::invalid(
                "k-means",
                "tolerance",
                format!("must be non-negative, got {}", c.tolerance),
            ));
        }
        if !c.energy_weight.is_finite() || c.energy_weight <= 0.0 {
            return Err(ReductionError::invalid(
                "k-means",
                "energy_weight",
                format!("must be positive, got {}", c.energy_weight),
            ));
        }
        Ok(())
    }

    /// Runs the restarts on `hits` and returns the best fit.
    ///
    /// # Errors
    /// Returns [`ReductionError`] if the configuration is invalid.
    pub fn fit(&self, hits: &HitCloud) -> Result<KMeansFit, ReductionError> {
        self.validate()?;
        let n = hits.len();
        let k = self.config.clusters.min(n);
        if k < self.config.clusters {
            warn!(
                "k-means: {} clusters requested for {n} hits, capping at {k}",
                self.config.clusters
            );
        }

        let dim = self.space.dim();
        let features = self.features(hits);
        if k == 0 {
            return Ok(KMeansFit {
                labels: Vec::new(),
                centroids: Vec::new(),
                inertia: 0.0,
                iterations: 0,
            });
        }

        let threshold = self.config.tolerance * mean_variance(&features, dim);
        let mut rng = self.rng();
        let max_iterations = self.config.max_iterations;
        let mut best = lloyd(&features, dim, k, &mut rng, max_iterations, threshold);
        debug!(
            "k-means restart 0: inertia {:.6e} after {} iterations",
            best.inertia, best.iterations
        );
        for restart in 1..self.config.restarts {
            let fit = lloyd(&features, dim, k, &mut rng, max_iterations, threshold);
            debug!(
                "k-means restart {restart}: inertia {:.6e} after {} iterations",
                fit.inertia, fit.iterations
            );
            if fit.inertia < best.inertia {
                best = fit;
            }
        }
        Ok(best)
    }
}

impl ReductionStrategy for KMeansClustering {
    fn name(&self) -> String {
        match self.space {
            FeatureSpace::Position => "K-means clustering".to_string(),
            FeatureSpace::PositionEnergy => "K-means clustering 4D".to_string(),
        }
    }

    fn energy_policy(&self) -> EnergyPolicy {
        match self.space {
            FeatureSpace::Position => EnergyPolicy::Sum,
            FeatureSpace::PositionEnergy => EnergyPolicy::Mean,
        }
    }

    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError> {
        let fit = self.fit(hits)?;
        let k = self.config.clusters.min(hits.len());
        let aggregation = match self.space {
            FeatureSpace::Position => EnergyAggregation::Sum,
            FeatureSpace::PositionEnergy => EnergyAggregation::Mean,
        };
        Ok(extract_clusters(
            self.name(),
            hits,
            &fit.labels,
            k,
            aggregation,
        ))
    }
}

/// Mean over features of the per-feature population variance.
fn mean_variance(features: &[f64], dim: usize) -> f64 {
    let n = features.len() / dim;
    if n == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for d in 0..dim {
        let column = features.iter().skip(d).step_by(dim);
        let mean = column.clone().sum::<f64>() / n as f64;
        total += column.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    }
    total / dim as f64
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Assigns every point to its nearest centroid, lowest index on ties.
/// Returns the inertia, summed in point order so restarts compare reproducibly.
fn assign(features: &[f64], dim: usize, centroids: &[f64], labels: &mut [i32]) -> f64 {
    let distances: Vec<f64> = labels
        .par_iter_mut()
        .zip(features.par_chunks(dim))
        .map(|(label, point)| {
            let (best, dist) = centroids
                .chunks(dim)
                .map(|c| squared_distance(point, c))
                .enumerate()
                .fold((0, f64::INFINITY), |acc, (j, d)| if d < acc.1 { (j, d) } else { acc });
            *label = best as i32;
            dist
        })
        .collect();
    distances.iter().sum()
}

fn lloyd(
    features: &[f64],
    dim: usize,
    k: usize,
    rng: &mut ChaCha8Rng,
    max_iterations: usize,
    threshold: f64,
) -> KMeansFit {
    let n = features.len() / dim;
    let mut centroids: Vec<f64> = rand::seq::index::sample(rng, n, k)
        .into_iter()
        .flat_map(|i| features[i * dim..(i + 1) * dim].iter().copied())
        .collect();
    let mut labels = vec![0_i32; n];
    let mut sums = vec![0.0; k * dim];
    let mut counts = vec![0_usize; k];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        assign(features, dim, &centroids, &mut labels);

        sums.fill(0.0);
        counts.fill(0);
        for (point, &label) in features.chunks(dim).zip(&labels) {
            let j = label as usize;
            counts[j] += 1;
            for (s, v) in sums[j * dim..(j + 1) * dim].iter_mut().zip(point) {
                *s += v;
            }
        }

        let mut shift = 0.0;
        for j in 0..k {
            // Empty clusters keep their previous centroid.
            if counts[j] == 0 {
                continue;
            }
            let centroid = &mut centroids[j * dim..(j + 1) * dim];
            for (c, s) in centroid.iter_mut().zip(&sums[j * dim..(j + 1) * dim]) {
                let updated = s / counts[j] as f64;
                shift += (updated - *c).powi(2);
                *c = updated;
            }
        }

        if shift <= threshold {
            break;
        }
    }

    let inertia = assign(features, dim, &centroids, &mut labels);
    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}
