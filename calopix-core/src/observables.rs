//! Calorimetric observables of a reduced cloud.
#![allow(clippy::cast_precision_loss)]

use crate::error::ObservableError;
use crate::hit::Position;
use crate::reduced::ReducedCloud;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary statistics of a reduced cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservableSet {
    /// Number of points.
    pub count: usize,
    /// Mean point energy.
    pub energy_mean: f64,
    /// Population standard deviation of point energies.
    pub energy_std: f64,
    /// Energy-weighted centroid.
    pub barycenter: Position,
    /// Energy-weighted RMS distance from the barycenter.
    pub rms: f64,
    /// Sum of point energies.
    pub total_energy: f64,
}

impl ObservableSet {
    /// Computes the observables of `cloud`.
    ///
    /// # Errors
    /// Returns [`ObservableError::EmptyCloud`] for a cloud without points and
    /// [`ObservableError::DegenerateWeights`] when the energies sum to zero.
    pub fn compute(cloud: &ReducedCloud) -> Result<Self, ObservableError> {
        if cloud.is_empty() {
            return Err(ObservableError::EmptyCloud);
        }

        let count = cloud.len();
        let total_energy = cloud.total_energy();
        let energy_mean = total_energy / count as f64;
        let variance = cloud
            .energies()
            .iter()
            .map(|e| (e - energy_mean).powi(2))
            .sum::<f64>()
            / count as f64;

        if total_energy == 0.0 || !total_energy.is_finite() {
            return Err(ObservableError::DegenerateWeights {
                total: total_energy,
            });
        }

        let weighted = cloud
            .iter()
            .fold(Position::ORIGIN, |acc, (p, e)| acc + *p * e);
        let barycenter = weighted / total_energy;

        let spread = cloud
            .iter()
            .map(|(p, e)| e * p.distance_squared(&barycenter))
            .sum::<f64>()
            / total_energy;

        Ok(Self {
            count,
            energy_mean,
            energy_std: variance.sqrt(),
            barycenter,
            rms: spread.max(0.0).sqrt(),
            total_energy,
        })
    }
}
