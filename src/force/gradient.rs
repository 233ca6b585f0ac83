//! Spacing-aware central-difference gradients.
//!
//! Interior voxels use central differences; at a volume face the missing
//! neighbor is replicate-clamped, which degrades to a one-sided difference
//! over the actual physical span instead of a spurious zero.

use crate::volume::{VectorField, Volume};

/// Gradient of `vol` at a voxel, in physical units (per spacing).
#[inline]
pub(crate) fn central_difference<const D: usize>(vol: &Volume<D>, index: [usize; D]) -> [f64; D] {
    let geom = vol.geometry();
    let size = geom.size();
    let spacing = geom.spacing();
    let mut grad = [0.0f64; D];
    for axis in 0..D {
        if size[axis] < 2 {
            continue;
        }
        let lo = index[axis].saturating_sub(1);
        let hi = (index[axis] + 1).min(size[axis] - 1);
        let mut lo_index = index;
        lo_index[axis] = lo;
        let mut hi_index = index;
        hi_index[axis] = hi;
        let span = (hi - lo) as f64 * spacing[axis];
        grad[axis] = (vol.at(hi_index) as f64 - vol.at(lo_index) as f64) / span;
    }
    grad
}

/// Precomputes the gradient at every voxel as a vector field.
///
/// Used by the mapped-moving strategy, which interpolates this field at
/// deformed positions instead of re-deriving gradients per sample.
pub(crate) fn gradient_field<const D: usize>(vol: &Volume<D>) -> VectorField<D> {
    let geom = *vol.geometry();
    let mut field = VectorField::zeros(geom);
    for linear in 0..geom.num_voxels() {
        let grad = central_difference(vol, geom.index_at(linear));
        let mut v = [0.0f32; D];
        for axis in 0..D {
            v[axis] = grad[axis] as f32;
        }
        field.data_mut()[linear] = v;
    }
    field
}
