//! Reduction strategy trait.

use crate::error::ReductionError;
use crate::hit::HitCloud;
use crate::reduced::{EnergyPolicy, ReducedCloud};

/// Trait for reduction strategies.
///
/// A strategy maps one event's hit cloud to a smaller representative cloud.
/// Implementations must not retain state between calls, so one instance can
/// reduce many clouds and run concurrently with other strategies.
pub trait ReductionStrategy: Send + Sync {
    /// Human-readable name, used as the report row label.
    fn name(&self) -> String;

    /// How output energies relate to member energies.
    fn energy_policy(&self) -> EnergyPolicy;

    /// Reduces `hits` into a new cloud.
    ///
    /// # Errors
    /// Returns [`ReductionError`] if the strategy is misconfigured.
    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError>;
}
