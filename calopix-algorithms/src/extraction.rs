//! Turning cluster labels into reduced points.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use calopix_core::{HitCloud, Position, ReducedCloud};

/// Label assigned to hits that belong to no cluster.
pub const NOISE: i32 = -1;

/// How member energies are combined into the output energy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyAggregation {
    /// Sum of member energies.
    Sum,
    /// Mean of member energies.
    Mean,
}

/// Running sums for one cluster.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ClusterAccumulator {
    position_sum: Position,
    energy_sum: f64,
    count: usize,
}

impl ClusterAccumulator {
    pub(crate) fn add(&mut self, position: &Position, energy: f64) {
        self.position_sum += *position;
        self.energy_sum += energy;
        self.count += 1;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn energy_sum(&self) -> f64 {
        self.energy_sum
    }

    pub(crate) fn mean_position(&self) -> Position {
        self.position_sum / self.count as f64
    }

    pub(crate) fn energy(&self, aggregation: EnergyAggregation) -> f64 {
        match aggregation {
            EnergyAggregation::Sum => self.energy_sum,
            EnergyAggregation::Mean => self.energy_sum / self.count as f64,
        }
    }
}

/// Builds one output point per non-empty cluster.
///
/// `labels` is parallel to the hits; labels outside `0..num_clusters`
/// (including [`NOISE`]) are skipped, so their energy does not reach the
/// output. Each point sits at the arithmetic mean of its members. Points are
/// emitted in cluster-id order and empty clusters produce nothing.
pub fn extract_clusters(
    name: impl Into<String>,
    hits: &HitCloud,
    labels: &[i32],
    num_clusters: usize,
    aggregation: EnergyAggregation,
) -> ReducedCloud {
    debug_assert_eq!(hits.len(), labels.len());

    let mut clusters = vec![ClusterAccumulator::default(); num_clusters];
    for ((position, energy), &label) in hits.iter().zip(labels) {
        if label >= 0 {
            if let Some(acc) = clusters.get_mut(label as usize) {
                acc.add(position, energy);
            }
        }
    }

    let mut reduced = ReducedCloud::with_capacity(name, num_clusters);
    for acc in clusters.iter().filter(|acc| !acc.is_empty()) {
        reduced.push(acc.mean_position(), acc.energy(aggregation));
    }
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hits() -> HitCloud {
        HitCloud::from_columns(
            &[0.0, 2.0, 100.0, 50.0],
            &[0.0, 0.0, 100.0, 50.0],
            &[0.0, 0.0, 0.0, 0.0],
            &[1.0, 3.0, 0.5, 9.0],
        )
        .unwrap()
    }

    #[test]
    fn test_sum_aggregation() {
        let reduced = extract_clusters(
            "sum",
            &hits(),
            &[0, 0, 1, NOISE],
            2,
            EnergyAggregation::Sum,
        );
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced.positions()[0], Position::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(reduced.energies()[0], 4.0);
        assert_abs_diff_eq!(reduced.energies()[1], 0.5);
        // The noise hit's energy is dropped.
        assert_abs_diff_eq!(reduced.total_energy(), 4.5);
    }

    #[test]
    fn test_mean_aggregation() {
        let reduced = extract_clusters("mean", &hits(), &[0, 0, 1, 1], 2, EnergyAggregation::Mean);
        assert_abs_diff_eq!(reduced.energies()[0], 2.0);
        assert_abs_diff_eq!(reduced.energies()[1], 4.75);
    }

    #[test]
    fn test_empty_clusters_are_skipped() {
        let reduced = extract_clusters("gaps", &hits(), &[3, 3, 0, 0], 5, EnergyAggregation::Sum);
        assert_eq!(reduced.len(), 2);
        assert_abs_diff_eq!(reduced.energies()[0], 9.5);
        assert_abs_diff_eq!(reduced.energies()[1], 4.0);
    }
}
