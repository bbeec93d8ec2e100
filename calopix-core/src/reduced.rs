//! Reduced point clouds and per-strategy energy aggregation policies.

use crate::error::{Error, Result};
use crate::hit::Position;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative tolerance used when comparing energy totals.
pub const ENERGY_TOLERANCE: f64 = 1e-9;

/// How a strategy aggregates member energies into an output point.
///
/// Strategies do not share one conservation contract; each one declares its
/// rule so that callers can check the invariant that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EnergyPolicy {
    /// Output energy is the sum of member energies. Total energy is conserved.
    Sum,
    /// Output energy is the mean of member energies. Total energy is not conserved.
    Mean,
    /// Members are summed but noise points are excluded, so the total can only shrink.
    DropNoise,
}

impl EnergyPolicy {
    /// Short policy label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::DropNoise => "drop-noise",
        }
    }

    /// Returns true if the policy guarantees `output_total == input_total`.
    #[must_use]
    pub fn conserves_energy(self) -> bool {
        matches!(self, Self::Sum)
    }

    /// Checks the total-energy invariant of this policy.
    #[must_use]
    pub fn holds(self, input_total: f64, output_total: f64) -> bool {
        let slack = ENERGY_TOLERANCE * input_total.abs().max(output_total.abs()) + f64::EPSILON;
        match self {
            Self::Sum => (input_total - output_total).abs() <= slack,
            Self::Mean => true,
            Self::DropNoise => output_total <= input_total + slack,
        }
    }
}

impl fmt::Display for EnergyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a reduction strategy: parallel positions and energies plus the
/// human-readable name of the strategy that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ReducedCloud {
    name: String,
    positions: Vec<Position>,
    energies: Vec<f64>,
}

impl ReducedCloud {
    /// Creates an empty reduced cloud.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, 0)
    }

    /// Creates an empty reduced cloud with pre-allocated capacity.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            positions: Vec::with_capacity(capacity),
            energies: Vec::with_capacity(capacity),
        }
    }

    /// Creates a reduced cloud from parallel vectors.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the lengths differ.
    pub fn from_parts(
        name: impl Into<String>,
        positions: Vec<Position>,
        energies: Vec<f64>,
    ) -> Result<Self> {
        if positions.len() != energies.len() {
            return Err(Error::ShapeMismatch {
                positions: positions.len(),
                energies: energies.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            positions,
            energies,
        })
    }

    /// Appends one output point.
    pub fn push(&mut self, position: Position, energy: f64) {
        self.positions.push(position);
        self.energies.push(energy);
    }

    /// Name of the producing strategy.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Point positions.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Point energies, parallel to [`ReducedCloud::positions`].
    #[must_use]
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Sum of all point energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }

    /// Smallest and largest point energy, or `None` for an empty cloud.
    #[must_use]
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.energies.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), e| (lo.min(e), hi.max(e))))
    }

    /// Iterates over `(position, energy)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.positions.iter().zip(self.energies.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_cloud_push() {
        let mut cloud = ReducedCloud::with_capacity("test", 2);
        assert!(cloud.is_empty());
        cloud.push(Position::new(1.0, 2.0, 3.0), 0.5);
        cloud.push(Position::ORIGIN, 1.5);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.name(), "test");
        assert!((cloud.total_energy() - 2.0).abs() < f64::EPSILON);
        assert_eq!(cloud.energy_range(), Some((0.5, 1.5)));
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let err = ReducedCloud::from_parts("bad", vec![Position::ORIGIN], vec![]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_policy_checks() {
        assert!(EnergyPolicy::Sum.holds(4.0, 4.0 + 1e-12));
        assert!(!EnergyPolicy::Sum.holds(4.0, 3.9));
        assert!(EnergyPolicy::DropNoise.holds(4.0, 3.0));
        assert!(!EnergyPolicy::DropNoise.holds(4.0, 4.5));
        assert!(EnergyPolicy::Mean.holds(4.0, 0.1));
        assert!(EnergyPolicy::Sum.conserves_energy());
        assert!(!EnergyPolicy::Mean.conserves_energy());
        assert_eq!(EnergyPolicy::DropNoise.to_string(), "drop-noise");
    }
}
