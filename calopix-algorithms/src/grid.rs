//! Grid binning.
//!
//! Divides space into cubes and replaces the hits of every populated cube by
//! one point at their arithmetic mean carrying their summed energy.

use crate::extraction::ClusterAccumulator;
use calopix_core::{
    BinningMode, EnergyPolicy, HitCloud, ReducedCloud, ReductionError, ReductionStrategy,
};
use log::debug;
use std::collections::HashMap;

/// Grid binning configuration.
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Cube edge length.
    pub cell_size: f64,
    /// Cell index rule.
    pub mode: BinningMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            mode: BinningMode::Truncate,
        }
    }
}

/// Grid binning strategy.
#[derive(Clone, Debug, Default)]
pub struct GridBinning {
    config: GridConfig,
}

impl GridBinning {
    /// Create with custom configuration.
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    /// Create with the given cell size and default binning mode.
    pub fn with_cell_size(cell_size: f64) -> Self {
        Self::new(GridConfig {
            cell_size,
            ..GridConfig::default()
        })
    }

    /// Get cell size.
    pub fn cell_size(&self) -> f64 {
        self.config.cell_size
    }

    fn key(&self, x: f64, y: f64, z: f64) -> (i64, i64, i64) {
        let size = self.config.cell_size;
        let mode = self.config.mode;
        (
            mode.cell_index(x, size),
            mode.cell_index(y, size),
            mode.cell_index(z, size),
        )
    }
}

impl ReductionStrategy for GridBinning {
    fn name(&self) -> String {
        let size = self.config.cell_size;
        match self.config.mode {
            BinningMode::Truncate => format!("Grouped by {size}x{size}x{size} cubes"),
            BinningMode::Floor => format!("Grouped by {size}x{size}x{size} cubes (floor)"),
        }
    }

    fn energy_policy(&self) -> EnergyPolicy {
        EnergyPolicy::Sum
    }

    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError> {
        let size = self.config.cell_size;
        if size.is_nan() || size <= 0.0 {
            return Err(ReductionError::invalid(
                "grid",
                "cell_size",
                format!("must be positive, got {size}"),
            ));
        }

        // Bins are emitted in order of first occupancy.
        let mut slots: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut bins: Vec<ClusterAccumulator> = Vec::new();
        for (p, energy) in hits.iter() {
            let slot = *slots.entry(self.key(p.x, p.y, p.z)).or_insert_with(|| {
                bins.push(ClusterAccumulator::default());
                bins.len() - 1
            });
            bins[slot].add(p, energy);
        }

        debug!(
            "grid {size}: {} hits into {} bins",
            hits.len(),
            bins.len()
        );

        let mut reduced = ReducedCloud::with_capacity(self.name(), bins.len());
        for bin in &bins {
            reduced.push(bin.mean_position(), bin.energy_sum());
        }
        Ok(reduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use calopix_core::Position;

    #[test]
    fn test_large_cell_collapses_everything() {
        let hits = HitCloud::from_columns(
            &[0.0, 10.0, 0.0, 0.0],
            &[0.0, 0.0, 10.0, 0.0],
            &[0.0, 0.0, 0.0, 10.0],
            &[1.0; 4],
        )
        .unwrap();
        let reduced = GridBinning::with_cell_size(100.0).reduce(&hits).unwrap();
        assert_eq!(reduced.len(), 1);
        assert_abs_diff_eq!(reduced.total_energy(), 4.0);
        assert_eq!(reduced.positions()[0], Position::new(2.5, 2.5, 2.5));
    }

    #[test]
    fn test_bins_follow_first_occupancy() {
        let hits = HitCloud::from_columns(
            &[25.0, 1.0, 27.0, 3.0],
            &[0.0; 4],
            &[0.0; 4],
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let reduced = GridBinning::with_cell_size(10.0).reduce(&hits).unwrap();
        assert_eq!(reduced.len(), 2);
        assert_abs_diff_eq!(reduced.positions()[0].x, 26.0);
        assert_abs_diff_eq!(reduced.energies()[0], 4.0);
        assert_abs_diff_eq!(reduced.positions()[1].x, 2.0);
        assert_abs_diff_eq!(reduced.energies()[1], 6.0);
    }

    #[test]
    fn test_truncation_merges_across_zero() {
        let hits =
            HitCloud::from_columns(&[-0.5, 0.5], &[0.0; 2], &[0.0; 2], &[1.0, 1.0]).unwrap();

        let truncated = GridBinning::with_cell_size(10.0).reduce(&hits).unwrap();
        assert_eq!(truncated.len(), 1);

        let floored = GridBinning::new(GridConfig {
            cell_size: 10.0,
            mode: BinningMode::Floor,
        })
        .reduce(&hits)
        .unwrap();
        assert_eq!(floored.len(), 2);
        assert!(floored.name().ends_with("(floor)"));
    }

    #[test]
    fn test_names() {
        assert_eq!(
            GridBinning::with_cell_size(10.0).name(),
            "Grouped by 10x10x10 cubes"
        );
        assert_eq!(
            GridBinning::with_cell_size(2.5).name(),
            "Grouped by 2.5x2.5x2.5 cubes"
        );
    }

    #[test]
    fn test_rejects_non_positive_cell() {
        let hits = HitCloud::default();
        assert!(GridBinning::with_cell_size(0.0).reduce(&hits).is_err());
        assert!(GridBinning::with_cell_size(-1.0).reduce(&hits).is_err());
    }
}
