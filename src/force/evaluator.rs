//! Per-voxel demons force evaluation.
//!
//! One call per voxel per iteration, driven by the sweep loops in
//! [`crate::iteration`]. All failure modes local to a voxel (unmapped or
//! saturated moving sample, sub-threshold mismatch, degenerate
//! denominator, out-of-band distance-map value) resolve to a zero update
//! excluded from the iteration statistics; nothing propagates as an error.

use crate::iteration::IterationContext;
use crate::util::math::{clamp_magnitude, norm_sq, scale};
use crate::volume::Volume;

/// Result of evaluating the force at one voxel.
#[derive(Clone, Copy, Debug)]
pub struct VoxelUpdate<const D: usize> {
    /// Displacement update in physical units.
    pub update: [f64; D],
    /// Squared intensity difference, this voxel's metric contribution.
    pub squared_difference: f64,
    /// Squared update magnitude, this voxel's RMS-change contribution.
    pub squared_change: f64,
    /// Whether the voxel counts toward the iteration statistics. False on
    /// every short-circuit path; such voxels are excluded from the
    /// processed-pixel count entirely.
    pub included: bool,
}

impl<const D: usize> VoxelUpdate<D> {
    /// A zero update excluded from the statistics.
    #[inline]
    pub(crate) fn excluded() -> Self {
        Self {
            update: [0.0; D],
            squared_difference: 0.0,
            squared_change: 0.0,
            included: false,
        }
    }
}

/// Computes the demons update at one voxel.
pub(crate) fn compute_update<const D: usize>(
    ctx: &IterationContext<'_, D>,
    index: [usize; D],
) -> VoxelUpdate<D> {
    let linear = ctx.fixed.geometry().linear(index);

    let fixed_view = ctx.fixed_view();
    let fixed_value = fixed_view.get(linear);
    if fixed_value == Volume::<D>::SENTINEL {
        return VoxelUpdate::excluded();
    }

    let Some(moving) = ctx.moving_sample(index) else {
        return VoxelUpdate::excluded();
    };

    let difference = fixed_value as f64 - moving.intensity;
    if difference.abs() < ctx.params.intensity_difference_threshold {
        return VoxelUpdate::excluded();
    }

    let gradient = ctx.combined_gradient(index, &moving);

    let denominator = norm_sq(&gradient) + ctx.normalizer * difference * difference;
    if denominator < ctx.denominator_threshold {
        return VoxelUpdate::excluded();
    }

    let mut update = gradient;
    scale(&mut update, difference / denominator);

    if ctx.distance_masking_active() {
        if !ctx.within_distance_band(linear) {
            return VoxelUpdate::excluded();
        }
        scale(&mut update, ctx.params.reg_weight);
    }

    if ctx.params.use_jacobian {
        if let Some(jacobian) = ctx.aux.jacobian_det {
            scale(&mut update, jacobian.get(linear) as f64);
        }
    }

    if ctx.params.use_forward_weight {
        if let Some(weight) = ctx.aux.forward_weight {
            scale(&mut update, weight.get(linear) as f64);
        }
    }

    clamp_magnitude(&mut update, ctx.params.max_update_step_length);

    VoxelUpdate {
        update,
        squared_difference: difference * difference,
        squared_change: norm_sq(&update),
        included: true,
    }
}
