//! demonsreg computes symmetric, inverse-consistent demons forces for
//! deformable image registration.
//!
//! Given a fixed volume and a moving volume warped by the current
//! deformation field, [`begin_iteration`] builds the per-iteration caches
//! and an [`IterationContext`] whose sweep evaluates a displacement
//! update at every voxel, with optional Jacobian, confidence-weight and
//! signed-distance-band terms. Iteration statistics (mean squared
//! difference, RMS field change) are reduced through worker-owned blocks
//! and a single mutex so an outer solver can poll convergence.
//!
//! The outer solver loop, field regularization and volume I/O are out of
//! scope; this crate is the per-voxel kernel those collaborators drive.
//! Optional parallelism is available via the `rayon` feature.

pub mod force;
pub mod iteration;
mod trace;
pub mod util;
pub mod volume;

pub use force::{AuxFields, DemonsParams, GradientType, VoxelUpdate};
pub use iteration::{
    begin_iteration, IterationContext, IterationSummary, MovingSample, StatsAccumulator,
    StatsBlock,
};
pub use util::{DemonsError, DemonsResult};
pub use volume::distance::signed_distance_map;
pub use volume::interp::Interpolation;
pub use volume::warp::warp;
pub use volume::{Geometry, VectorField, Volume};
