//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// File extension not handled by this build.
    #[error("unsupported event file format: {0}")]
    UnsupportedFormat(String),

    /// An event's arrays are inconsistent.
    #[error("event {index}: {source}")]
    InvalidEvent {
        index: usize,
        #[source]
        source: calopix_core::Error,
    },

    /// Requested event index does not exist.
    #[error("event {index} out of range ({available} events available)")]
    EventOutOfRange { index: usize, available: usize },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] calopix_core::Error),
}
