//! calopix-io: Event file ingestion for calopix.
//!
//! This crate reads structured event files into per-event hit arrays,
//! rejects malformed events at the boundary and reports dataset-level
//! diagnostics. JSON files are memory-mapped via memmap2; HDF5 support is
//! behind the `hdf5` feature.
//!

mod error;
mod event;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod reader;
mod summary;

pub use error::{Error, Result};
pub use event::{EventData, DEFAULT_COLLECTION};
pub use reader::{EventFileFormat, EventFileReader, MappedFileReader};
pub use summary::DatasetSummary;
