//! Configuration of the demons force and the optional auxiliary fields.

use crate::util::{DemonsError, DemonsResult};
use crate::volume::interp::Interpolation;
use crate::volume::Volume;

/// Which image gradients drive the force.
///
/// The choice is fixed for a whole registration run, not varied per voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientType {
    /// Mean of the fixed-image gradient and the warped-moving gradient.
    /// Removes the directional bias of Thirion's original one-sided force.
    #[default]
    Symmetric,
    /// Fixed-image gradient only. Cheapest, weakest for large motion.
    Fixed,
    /// Finite differences on the pre-warped moving copy, avoiding a second
    /// interpolation pass.
    WarpedMoving,
    /// The unwarped moving volume's precomputed gradient field interpolated
    /// at the mapped physical position.
    MappedMoving,
}

/// Immutable-per-iteration parameters of the force computation.
#[derive(Clone, Copy, Debug)]
pub struct DemonsParams {
    /// Absolute intensity differences below this count as already matched
    /// and produce a zero update. Must be >= 0.
    pub intensity_difference_threshold: f64,
    /// Upper bound on the per-voxel update magnitude, in physical units.
    /// Zero means unrestricted; beware numerical instability in that case.
    /// Thirion used 0.5.
    pub max_update_step_length: f64,
    /// Gradient-combination strategy.
    pub gradient_type: GradientType,
    /// Multiply updates by the local Jacobian-determinant value when the
    /// field is supplied.
    pub use_jacobian: bool,
    /// Multiply updates by the local forward-confidence weight when the
    /// field is supplied.
    pub use_forward_weight: bool,
    /// Scale applied to updates inside the valid signed-distance band when
    /// distance masking is active.
    pub reg_weight: f64,
    /// Half-width of the valid signed-distance band, in physical units.
    /// Voxels whose distance-map magnitude exceeds it contribute nothing.
    pub distance_band: f64,
    /// Interpolation used when warping the moving (and fixed) volumes.
    pub interpolation: Interpolation,
}

impl Default for DemonsParams {
    fn default() -> Self {
        Self {
            intensity_difference_threshold: 0.001,
            max_update_step_length: 0.5,
            gradient_type: GradientType::Symmetric,
            use_jacobian: false,
            use_forward_weight: false,
            reg_weight: 1.0,
            distance_band: 3.0,
            interpolation: Interpolation::Nearest,
        }
    }
}

impl DemonsParams {
    /// Checks parameter ranges. Called once at iteration setup.
    pub fn validate(&self) -> DemonsResult<()> {
        if !(self.intensity_difference_threshold >= 0.0) {
            return Err(DemonsError::InvalidParameter {
                name: "intensity_difference_threshold",
                value: self.intensity_difference_threshold,
            });
        }
        if !(self.max_update_step_length >= 0.0) {
            return Err(DemonsError::InvalidParameter {
                name: "max_update_step_length",
                value: self.max_update_step_length,
            });
        }
        if !(self.distance_band > 0.0) {
            return Err(DemonsError::InvalidParameter {
                name: "distance_band",
                value: self.distance_band,
            });
        }
        Ok(())
    }
}

/// Optional per-voxel weighting and masking inputs.
///
/// Every present field must share the fixed volume's grid geometry; each
/// absent field simply disables its term. Masks are binary volumes (inside
/// where the value exceeds 0.5) from which the iteration setup rebuilds
/// the current signed distance maps; the *original* distance maps are
/// built once by the caller via
/// [`signed_distance_map`](crate::volume::distance::signed_distance_map)
/// and passed here unchanged across iterations.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuxFields<'a, const D: usize> {
    /// Jacobian determinant of the deformation, used with
    /// [`DemonsParams::use_jacobian`].
    pub jacobian_det: Option<&'a Volume<D>>,
    /// Forward-confidence weight, used with
    /// [`DemonsParams::use_forward_weight`].
    pub forward_weight: Option<&'a Volume<D>>,
    /// Fixed-image tissue mask; enables distance masking together with
    /// `moving_mask`.
    pub fixed_mask: Option<&'a Volume<D>>,
    /// Moving-image tissue mask; enables distance masking together with
    /// `fixed_mask`.
    pub moving_mask: Option<&'a Volume<D>>,
    /// Signed distance map of the undeformed fixed mask.
    pub original_fixed_sdm: Option<&'a Volume<D>>,
    /// Signed distance map of the undeformed moving mask.
    pub original_moving_sdm: Option<&'a Volume<D>>,
}

impl<const D: usize> AuxFields<'_, D> {
    /// Whether distance-map masking is active (both masks supplied).
    pub fn distance_masking_enabled(&self) -> bool {
        self.fixed_mask.is_some() && self.moving_mask.is_some()
    }
}
