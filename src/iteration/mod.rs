//! Per-iteration setup and the full-pass sweep drivers.
//!
//! [`begin_iteration`] runs once per solver iteration, before any voxel is
//! touched: it validates geometry and parameters, computes the spacing
//! normalizer, and builds the iteration's caches (warped moving copy,
//! warped fixed copy for the inverse-consistent variant, precomputed
//! moving gradients, rebuilt signed distance maps). The resulting
//! [`IterationContext`] is immutable and shared read-only by every worker;
//! dropping it drops all caches, so no state carries over between
//! iterations.

use crate::force::evaluator::{self, VoxelUpdate};
use crate::force::gradient::{central_difference, gradient_field};
use crate::force::params::{AuxFields, DemonsParams, GradientType};
use crate::trace::{trace_event, trace_span};
use crate::util::{DemonsError, DemonsResult};
use crate::volume::distance::signed_distance_map;
use crate::volume::interp::{sample_vector, Interpolation};
use crate::volume::warp::warp;
use crate::volume::{VectorField, Volume};

pub mod stats;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use stats::{IterationSummary, StatsAccumulator, StatsBlock};

/// Mask values above this count as inside the tissue region.
const MASK_THRESHOLD: f32 = 0.5;

/// Relative epsilon for the denominator guard; scaled by the spacing
/// normalizer at setup.
const DENOMINATOR_EPSILON: f64 = 1e-9;

/// Moving-image intensity and gradient resolved at one voxel.
#[derive(Clone, Copy, Debug)]
pub struct MovingSample<const D: usize> {
    /// Intensity of the moving image at the mapped position.
    pub intensity: f64,
    /// Moving-image gradient per the configured strategy. Zero for the
    /// fixed-gradient strategy, which does not use one.
    pub gradient: [f64; D],
}

/// Read-only shared state for one registration iteration.
pub struct IterationContext<'a, const D: usize> {
    pub(crate) fixed: &'a Volume<D>,
    pub(crate) moving: &'a Volume<D>,
    pub(crate) forward_field: &'a VectorField<D>,
    pub(crate) warped_moving: Volume<D>,
    pub(crate) warped_fixed: Option<Volume<D>>,
    pub(crate) moving_gradient: Option<VectorField<D>>,
    pub(crate) current_fixed_sdm: Option<Volume<D>>,
    pub(crate) current_moving_sdm: Option<Volume<D>>,
    pub(crate) aux: AuxFields<'a, D>,
    pub(crate) params: DemonsParams,
    pub(crate) normalizer: f64,
    pub(crate) denominator_threshold: f64,
}

/// Prepares the shared state for one iteration.
///
/// Checks every participating grid against the fixed volume's geometry,
/// warps the moving volume through the forward field (and the fixed
/// volume through the inverse field when one is supplied), precomputes
/// the moving gradient field for the mapped-moving strategy, and rebuilds
/// the current signed distance maps when both tissue masks are present.
///
/// The interpolation cost of warping is paid here once instead of per
/// voxel; the previous iteration's caches are replaced wholesale.
pub fn begin_iteration<'a, const D: usize>(
    fixed: &'a Volume<D>,
    moving: &'a Volume<D>,
    forward_field: &'a VectorField<D>,
    inverse_field: Option<&'a VectorField<D>>,
    aux: AuxFields<'a, D>,
    params: DemonsParams,
) -> DemonsResult<IterationContext<'a, D>> {
    params.validate()?;
    check_geometry(fixed, moving, forward_field, inverse_field, &aux)?;

    let _span = trace_span!("begin_iteration", voxels = fixed.geometry().num_voxels()).entered();

    let mean_spacing = fixed.geometry().mean_spacing();
    let normalizer = mean_spacing * mean_spacing;
    let denominator_threshold = DENOMINATOR_EPSILON * normalizer;

    let warped_moving = warp(
        moving,
        forward_field,
        params.interpolation,
        Volume::<D>::SENTINEL,
    )?;
    let warped_fixed = match inverse_field {
        Some(inverse) => Some(warp(
            fixed,
            inverse,
            params.interpolation,
            Volume::<D>::SENTINEL,
        )?),
        None => None,
    };

    let moving_gradient = match params.gradient_type {
        GradientType::MappedMoving => Some(gradient_field(moving)),
        _ => None,
    };

    let (current_fixed_sdm, current_moving_sdm) = match (aux.fixed_mask, aux.moving_mask) {
        (Some(fixed_mask), Some(moving_mask)) => {
            let fixed_sdm = match inverse_field {
                Some(inverse) => {
                    let warped = warp(fixed_mask, inverse, Interpolation::Nearest, 0.0)?;
                    signed_distance_map(&warped, MASK_THRESHOLD)
                }
                None => signed_distance_map(fixed_mask, MASK_THRESHOLD),
            };
            let warped_mask = warp(moving_mask, forward_field, Interpolation::Nearest, 0.0)?;
            let moving_sdm = signed_distance_map(&warped_mask, MASK_THRESHOLD);
            (Some(fixed_sdm), Some(moving_sdm))
        }
        _ => (None, None),
    };

    trace_event!(
        "iteration_ready",
        masking = current_fixed_sdm.is_some(),
        inverse_consistent = warped_fixed.is_some()
    );

    Ok(IterationContext {
        fixed,
        moving,
        forward_field,
        warped_moving,
        warped_fixed,
        moving_gradient,
        current_fixed_sdm,
        current_moving_sdm,
        aux,
        params,
        normalizer,
        denominator_threshold,
    })
}

fn check_geometry<const D: usize>(
    fixed: &Volume<D>,
    moving: &Volume<D>,
    forward_field: &VectorField<D>,
    inverse_field: Option<&VectorField<D>>,
    aux: &AuxFields<'_, D>,
) -> DemonsResult<()> {
    let reference = fixed.geometry();
    let mismatch = |context| DemonsError::GeometryMismatch { context };

    if !reference.matches(moving.geometry()) {
        return Err(mismatch("moving volume"));
    }
    if !reference.matches(forward_field.geometry()) {
        return Err(mismatch("forward deformation field"));
    }
    if let Some(inverse) = inverse_field {
        if !reference.matches(inverse.geometry()) {
            return Err(mismatch("inverse deformation field"));
        }
    }
    let aux_inputs: [(Option<&Volume<D>>, &'static str); 6] = [
        (aux.jacobian_det, "jacobian determinant field"),
        (aux.forward_weight, "forward weight field"),
        (aux.fixed_mask, "fixed mask"),
        (aux.moving_mask, "moving mask"),
        (aux.original_fixed_sdm, "original fixed distance map"),
        (aux.original_moving_sdm, "original moving distance map"),
    ];
    for (field, context) in aux_inputs {
        if let Some(volume) = field {
            if !reference.matches(volume.geometry()) {
                return Err(mismatch(context));
            }
        }
    }
    Ok(())
}

impl<const D: usize> IterationContext<'_, D> {
    /// The spacing normalizer `mean(spacing)^2` for this iteration.
    pub fn normalizer(&self) -> f64 {
        self.normalizer
    }

    /// The parameters this iteration was built with.
    pub fn params(&self) -> &DemonsParams {
        &self.params
    }

    /// The cached moving volume warped through the forward field.
    pub fn warped_moving(&self) -> &Volume<D> {
        &self.warped_moving
    }

    /// The fixed-side view the force reads: the fixed volume warped
    /// through the inverse field when inverse consistency is on, the raw
    /// fixed volume otherwise.
    pub(crate) fn fixed_view(&self) -> &Volume<D> {
        self.warped_fixed.as_ref().unwrap_or(self.fixed)
    }

    /// Resolves the moving intensity and gradient at a voxel.
    ///
    /// Returns `None` when the warped sample carries the saturated
    /// sentinel or, for the mapped-moving strategy, when the mapped
    /// physical position falls outside the moving domain.
    pub fn moving_sample(&self, index: [usize; D]) -> Option<MovingSample<D>> {
        let linear = self.fixed.geometry().linear(index);
        let intensity = self.warped_moving.get(linear);
        if intensity == Volume::<D>::SENTINEL {
            return None;
        }

        let gradient = match self.params.gradient_type {
            GradientType::Symmetric | GradientType::WarpedMoving => {
                central_difference(&self.warped_moving, index)
            }
            GradientType::Fixed => [0.0; D],
            GradientType::MappedMoving => {
                let disp = self.forward_field.get(linear);
                let mut point = self.fixed.geometry().index_to_physical(index);
                for axis in 0..D {
                    point[axis] += disp[axis] as f64;
                }
                let ci = self.moving.geometry().physical_to_continuous(point);
                sample_vector(self.moving_gradient.as_ref()?, ci)?
            }
        };

        Some(MovingSample {
            intensity: intensity as f64,
            gradient,
        })
    }

    /// Combines the fixed and moving gradients per the configured
    /// strategy.
    pub(crate) fn combined_gradient(
        &self,
        index: [usize; D],
        moving: &MovingSample<D>,
    ) -> [f64; D] {
        match self.params.gradient_type {
            GradientType::Symmetric => {
                let fixed = central_difference(self.fixed_view(), index);
                let mut mean = [0.0; D];
                for axis in 0..D {
                    mean[axis] = 0.5 * (fixed[axis] + moving.gradient[axis]);
                }
                mean
            }
            GradientType::Fixed => central_difference(self.fixed_view(), index),
            GradientType::WarpedMoving | GradientType::MappedMoving => moving.gradient,
        }
    }

    /// Whether the current signed distance maps were built this iteration.
    pub(crate) fn distance_masking_active(&self) -> bool {
        self.current_fixed_sdm.is_some() && self.current_moving_sdm.is_some()
    }

    /// Whether every present distance-map value at this voxel lies within
    /// the configured band.
    pub(crate) fn within_distance_band(&self, linear: usize) -> bool {
        let band = self.params.distance_band;
        let maps = [
            self.current_fixed_sdm.as_ref(),
            self.current_moving_sdm.as_ref(),
            self.aux.original_fixed_sdm,
            self.aux.original_moving_sdm,
        ];
        maps.into_iter()
            .flatten()
            .all(|map| (map.get(linear) as f64).abs() <= band)
    }

    /// Computes the displacement update at one voxel.
    pub fn compute_update(&self, index: [usize; D]) -> VoxelUpdate<D> {
        evaluator::compute_update(self, index)
    }

    /// Sequential full pass: evaluates every voxel, accumulates into one
    /// worker-local block and merges it once at the end.
    pub fn sweep(&self, accumulator: &StatsAccumulator) -> VectorField<D> {
        let geom = *self.fixed.geometry();
        let _span = trace_span!("sweep", voxels = geom.num_voxels()).entered();

        let mut out = VectorField::zeros(geom);
        let mut block = StatsBlock::new();
        for (linear, slot) in out.data_mut().iter_mut().enumerate() {
            let update = self.compute_update(geom.index_at(linear));
            let mut v = [0.0f32; D];
            for axis in 0..D {
                v[axis] = update.update[axis] as f32;
            }
            *slot = v;
            if update.included {
                block.record(update.squared_difference, update.squared_change);
            }
        }
        trace_event!("sweep_done", pixels = block.pixels_processed());
        accumulator.merge(block);
        out
    }
}
