//! Error types for calopix-core.

use thiserror::Error;

/// Result type alias for calopix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for calopix operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Position and energy sequences disagree in length.
    #[error("shape mismatch: {positions} positions but {energies} energies")]
    ShapeMismatch { positions: usize, energies: usize },

    /// Coordinate columns disagree in length.
    #[error("coordinate columns disagree: x={x}, y={y}, z={z}")]
    ColumnMismatch { x: usize, y: usize, z: usize },

    /// Negative or non-finite hit energy.
    #[error("invalid energy {value} at hit {index}")]
    InvalidEnergy { index: usize, value: f64 },

    /// Position with a NaN or infinite component.
    #[error("non-finite coordinate at hit {index}")]
    NonFiniteCoordinate { index: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Reduction error.
    #[error(transparent)]
    Reduction(#[from] ReductionError),

    /// Observable error.
    #[error(transparent)]
    Observable(#[from] ObservableError),
}

/// Errors raised by a reduction strategy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReductionError {
    /// A strategy parameter is outside its valid range.
    #[error("{strategy}: invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        strategy: &'static str,
        parameter: &'static str,
        reason: String,
    },
}

impl ReductionError {
    /// Shorthand for [`ReductionError::InvalidParameter`].
    pub fn invalid(
        strategy: &'static str,
        parameter: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            strategy,
            parameter,
            reason: reason.into(),
        }
    }
}

/// Errors raised while computing observables of a reduced cloud.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ObservableError {
    /// The cloud has no points.
    #[error("cannot compute observables of an empty cloud")]
    EmptyCloud,

    /// The energy weights sum to zero, so barycenter and RMS are undefined.
    #[error("energy weights sum to {total}; barycenter and RMS are undefined")]
    DegenerateWeights { total: f64 },
}
