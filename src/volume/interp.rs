//! Sampling volumes at continuous (fractional) grid indices.
//!
//! The interpolation strategy is a plain enum selected once in the
//! configuration; per-voxel dispatch is a branch, not a virtual call.
//! Sampling returns `None` outside the grid domain rather than
//! extrapolating.

use crate::volume::{VectorField, Volume};

/// Interpolation strategy for off-grid samples.
///
/// Nearest-neighbor is the default for warping the moving image: it is
/// cheap and never blends a genuine intensity with the reserved sentinel
/// value at the domain edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Round to the closest grid sample.
    #[default]
    Nearest,
    /// Multilinear blend of the 2^D surrounding samples.
    Linear,
}

/// Samples a scalar volume at a continuous index.
///
/// Returns `None` when the index lies outside the sampled domain.
#[inline]
pub fn sample_scalar<const D: usize>(
    vol: &Volume<D>,
    ci: [f64; D],
    interp: Interpolation,
) -> Option<f32> {
    let geom = vol.geometry();
    if !geom.contains_continuous(ci) {
        return None;
    }
    match interp {
        Interpolation::Nearest => {
            let mut index = [0usize; D];
            for axis in 0..D {
                index[axis] = ci[axis].round() as usize;
            }
            Some(vol.at(index))
        }
        Interpolation::Linear => {
            let (base, frac) = split_continuous(geom.size(), ci);
            let mut acc = 0.0f64;
            for corner in 0..(1usize << D) {
                let (index, weight) = corner_index(base, frac, geom.size(), corner);
                acc += weight * vol.at(index) as f64;
            }
            Some(acc as f32)
        }
    }
}

/// Samples a vector field at a continuous index with multilinear blending.
///
/// Returns `None` when the index lies outside the sampled domain.
#[inline]
pub fn sample_vector<const D: usize>(field: &VectorField<D>, ci: [f64; D]) -> Option<[f64; D]> {
    let geom = field.geometry();
    if !geom.contains_continuous(ci) {
        return None;
    }
    let (base, frac) = split_continuous(geom.size(), ci);
    let mut acc = [0.0f64; D];
    for corner in 0..(1usize << D) {
        let (index, weight) = corner_index(base, frac, geom.size(), corner);
        let v = field.at(index);
        for axis in 0..D {
            acc[axis] += weight * v[axis] as f64;
        }
    }
    Some(acc)
}

/// Splits a continuous index into a lower corner and per-axis fractions.
#[inline]
fn split_continuous<const D: usize>(
    size: [usize; D],
    ci: [f64; D],
) -> ([usize; D], [f64; D]) {
    let mut base = [0usize; D];
    let mut frac = [0.0f64; D];
    for axis in 0..D {
        // Containment guarantees 0 <= ci <= size-1; clamp the corner so a
        // sample exactly on the last plane still has a valid upper corner.
        let floor = ci[axis].floor().min((size[axis] - 1) as f64);
        base[axis] = floor as usize;
        frac[axis] = ci[axis] - floor;
    }
    (base, frac)
}

/// Index and weight of one of the 2^D interpolation corners.
#[inline]
fn corner_index<const D: usize>(
    base: [usize; D],
    frac: [f64; D],
    size: [usize; D],
    corner: usize,
) -> ([usize; D], f64) {
    let mut index = base;
    let mut weight = 1.0f64;
    for axis in 0..D {
        if corner & (1 << axis) != 0 {
            index[axis] = (base[axis] + 1).min(size[axis] - 1);
            weight *= frac[axis];
        } else {
            weight *= 1.0 - frac[axis];
        }
    }
    (index, weight)
}
