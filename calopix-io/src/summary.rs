//! Dataset-level diagnostics.
#![allow(clippy::cast_precision_loss)]

use crate::EventData;
use std::fmt;

/// Hit counts and energy statistics over every event in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Hit collection name.
    pub collection: String,
    /// Hits in each event.
    pub hits_per_event: Vec<usize>,
    /// Hits across all events.
    pub total_hits: usize,
    /// Mean hit energy in GeV, `None` without hits.
    pub energy_mean: Option<f64>,
    /// Population standard deviation of hit energy in GeV, `None` without hits.
    pub energy_std: Option<f64>,
}

impl DatasetSummary {
    /// Computes the summary of `data`.
    pub fn from_events(data: &EventData) -> Self {
        let energies = data.all_energies();
        let (energy_mean, energy_std) = if energies.is_empty() {
            (None, None)
        } else {
            let n = energies.len() as f64;
            let mean = energies.iter().sum::<f64>() / n;
            let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
            (Some(mean), Some(variance.sqrt()))
        };
        Self {
            collection: data.collection().to_string(),
            hits_per_event: data.hits_per_event(),
            total_hits: data.total_hits(),
            energy_mean,
            energy_std,
        }
    }

    /// Number of events.
    pub fn num_events(&self) -> usize {
        self.hits_per_event.len()
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Collection: {}", self.collection)?;
        if let (Some(mean), Some(std)) = (self.energy_mean, self.energy_std) {
            writeln!(
                f,
                "Energy mean: {:.6} MeV, standard deviation: {:.6} MeV",
                mean * 1e3,
                std * 1e3
            )?;
        }
        writeln!(f, "Hits per event: {:?}", self.hits_per_event)?;
        writeln!(f, "Number of events: {}", self.num_events())?;
        write!(f, "Total number of hits: {}", self.total_hits)
    }
}
