//! Demons force computation: configuration, gradients and the per-voxel
//! evaluator.

pub mod evaluator;
pub(crate) mod gradient;
pub mod params;

pub use evaluator::VoxelUpdate;
pub use params::{AuxFields, DemonsParams, GradientType};
