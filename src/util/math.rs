//! Small vector helpers for D-dimensional update vectors.

/// Squared Euclidean norm of a D-vector.
#[inline]
pub(crate) fn norm_sq<const D: usize>(v: &[f64; D]) -> f64 {
    v.iter().map(|c| c * c).sum()
}

/// Scales a D-vector in place.
#[inline]
pub(crate) fn scale<const D: usize>(v: &mut [f64; D], s: f64) {
    for c in v.iter_mut() {
        *c *= s;
    }
}

/// Clamps the magnitude of `v` to `max_len`, preserving direction.
///
/// The clamp is inclusive: a vector whose magnitude equals the bound is
/// left untouched. A `max_len` of zero means unrestricted.
#[inline]
pub(crate) fn clamp_magnitude<const D: usize>(v: &mut [f64; D], max_len: f64) {
    if max_len <= 0.0 {
        return;
    }
    let len = norm_sq(v).sqrt();
    if len > max_len {
        scale(v, max_len / len);
    }
}
