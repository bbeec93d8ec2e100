//! Pass-through baseline.

use calopix_core::{EnergyPolicy, HitCloud, ReducedCloud, ReductionError, ReductionStrategy};

/// Copies every hit to the output unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl ReductionStrategy for Identity {
    fn name(&self) -> String {
        "Original".to_string()
    }

    fn energy_policy(&self) -> EnergyPolicy {
        EnergyPolicy::Sum
    }

    fn reduce(&self, hits: &HitCloud) -> Result<ReducedCloud, ReductionError> {
        let mut reduced = ReducedCloud::with_capacity(self.name(), hits.len());
        for (position, energy) in hits.iter() {
            reduced.push(*position, energy);
        }
        Ok(reduced)
    }
}
