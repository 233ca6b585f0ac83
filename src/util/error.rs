//! Error types for demonsreg.

use thiserror::Error;

/// Result alias for demonsreg operations.
pub type DemonsResult<T> = std::result::Result<T, DemonsError>;

/// Errors that can occur when setting up a registration iteration.
///
/// Per-voxel conditions (out-of-domain samples, saturated intensities,
/// degenerate denominators) are not errors: they are recovered locally as
/// zero-contribution voxels and never surface here.
#[derive(Debug, Error)]
pub enum DemonsError {
    /// Two participating volumes or fields disagree in grid geometry.
    #[error("geometry mismatch: {context} does not match the fixed volume grid")]
    GeometryMismatch {
        /// Which input failed the check.
        context: &'static str,
    },
    /// A configuration parameter is outside its valid range.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A data buffer does not match the geometry it was paired with.
    #[error("buffer size mismatch: needed {needed} elements, got {got}")]
    BufferSizeMismatch {
        /// Number of elements the geometry requires.
        needed: usize,
        /// Number of elements supplied.
        got: usize,
    },
    /// A volume or field has a zero-length axis.
    #[error("empty volume: every axis must have nonzero size")]
    EmptyVolume,
}
