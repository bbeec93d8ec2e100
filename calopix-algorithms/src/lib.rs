//! calopix-algorithms: Reduction strategies for calorimeter hit clouds.
//!
//! This crate provides the registered strategies:
//! - **Identity** - pass-through baseline
//! - **Grid** - spatial binning into cubes, energy summed
//! - **K-means** - fixed cluster count, in 3D (energy summed) or 4D (energy averaged)
//! - **Mean-shift** - data-driven cluster count, energy summed
//! - **DBSCAN** - density-based with noise removal
//!
//! and the comparison run that reports observables for each of them.
//!
#![warn(missing_docs)]

pub mod comparison;
mod dbscan;
pub mod extraction;
mod grid;
mod identity;
mod kmeans;
mod mean_shift;
mod registry;
pub mod spatial;

pub use comparison::{
    compare, compare_with_sink, CloudSink, ComparisonReport, DiscardSink, ReportRow,
    StrategyFailure,
};
pub use dbscan::{DbscanClustering, DbscanConfig, DbscanState};
pub use extraction::{extract_clusters, EnergyAggregation, NOISE};
pub use grid::{GridBinning, GridConfig};
pub use identity::Identity;
pub use kmeans::{FeatureSpace, KMeansClustering, KMeansConfig, KMeansFit};
pub use mean_shift::{MeanShiftClustering, MeanShiftConfig};
pub use registry::StrategyRegistry;
pub use spatial::SpatialGrid;

// Re-export core reduction traits
pub use calopix_core::{EnergyPolicy, ReductionConfig, ReductionStrategy};
