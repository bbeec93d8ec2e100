//! Flattened per-event hit arrays.

use crate::{Error, Result};
use calopix_core::HitCloud;
use serde::Deserialize;

/// Hit collection read when a file does not name one.
pub const DEFAULT_COLLECTION: &str = "ECalBarrelCollection";

/// Hits of every event in a file, stored as flat columns with per-event
/// offsets (event `i` owns `offsets[i]..offsets[i + 1]`).
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    collection: String,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    energy: Vec<f64>,
    offsets: Vec<usize>,
}

/// One event as stored in a JSON event file.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(default)]
    pub z: Vec<f64>,
    #[serde(default)]
    pub energy: Vec<f64>,
}

impl RawEvent {
    fn shape_error(&self) -> Option<calopix_core::Error> {
        let (x, y, z) = (self.x.len(), self.y.len(), self.z.len());
        if x != y || x != z {
            return Some(calopix_core::Error::ColumnMismatch { x, y, z });
        }
        (x != self.energy.len()).then_some(calopix_core::Error::ShapeMismatch {
            positions: x,
            energies: self.energy.len(),
        })
    }
}

impl EventData {
    /// Builds event data from flat columns and per-event hit counts.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the columns disagree in length or
    /// the hit counts do not add up to the column length.
    pub fn from_flat(
        collection: impl Into<String>,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        energy: Vec<f64>,
        hits_per_event: &[usize],
    ) -> Result<Self> {
        let n = energy.len();
        if x.len() != n || y.len() != n || z.len() != n {
            return Err(Error::InvalidFormat(format!(
                "column lengths differ: x={}, y={}, z={}, energy={n}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        let mut offsets = Vec::with_capacity(hits_per_event.len() + 1);
        offsets.push(0);
        for &count in hits_per_event {
            let last: usize = offsets[offsets.len() - 1];
            let next = last.checked_add(count).ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "hits_per_event overflows after {} events",
                    offsets.len() - 1
                ))
            })?;
            offsets.push(next);
        }
        let counted = offsets[offsets.len() - 1];
        if counted != n {
            return Err(Error::InvalidFormat(format!(
                "hits_per_event sums to {counted} but columns hold {n} hits"
            )));
        }
        Ok(Self {
            collection: collection.into(),
            x,
            y,
            z,
            energy,
            offsets,
        })
    }

    /// Flattens per-event records, rejecting events whose arrays disagree.
    pub(crate) fn from_events(
        collection: impl Into<String>,
        events: Vec<RawEvent>,
    ) -> Result<Self> {
        let total: usize = events.iter().map(|e| e.energy.len()).sum();
        let mut data = Self {
            collection: collection.into(),
            x: Vec::with_capacity(total),
            y: Vec::with_capacity(total),
            z: Vec::with_capacity(total),
            energy: Vec::with_capacity(total),
            offsets: Vec::with_capacity(events.len() + 1),
        };
        data.offsets.push(0);
        for (index, event) in events.into_iter().enumerate() {
            if let Some(source) = event.shape_error() {
                return Err(Error::InvalidEvent { index, source });
            }
            data.x.extend(event.x);
            data.y.extend(event.y);
            data.z.extend(event.z);
            data.energy.extend(event.energy);
            data.offsets.push(data.energy.len());
        }
        Ok(data)
    }

    /// Name of the hit collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of events.
    pub fn num_events(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of hits across all events.
    pub fn total_hits(&self) -> usize {
        self.energy.len()
    }

    /// Number of hits in every event.
    pub fn hits_per_event(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Energies of every hit in the file.
    pub fn all_energies(&self) -> &[f64] {
        &self.energy
    }

    /// Hit cloud of event `index`.
    ///
    /// # Errors
    /// Returns [`Error::EventOutOfRange`] for a missing event and
    /// [`Error::InvalidEvent`] if a coordinate or energy is out of range.
    pub fn event(&self, index: usize) -> Result<HitCloud> {
        if index >= self.num_events() {
            return Err(Error::EventOutOfRange {
                index,
                available: self.num_events(),
            });
        }
        let range = self.offsets[index]..self.offsets[index + 1];
        HitCloud::from_columns(
            &self.x[range.clone()],
            &self.y[range.clone()],
            &self.z[range.clone()],
            &self.energy[range],
        )
        .map_err(|source| Error::InvalidEvent { index, source })
    }
}
