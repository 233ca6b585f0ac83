//! Signed Euclidean distance maps of binary masks.
//!
//! Exact separable squared distance transform (Felzenszwalb-Huttenlocher
//! parabola method) run once per axis, with per-axis anisotropic spacing.
//! Sign convention: negative inside the mask, positive outside,
//! zero-crossing at the boundary.

use crate::volume::{Geometry, Volume};

/// Large finite stand-in for "no site on this line yet"; finite so the
/// parabola intersections stay well defined.
const FAR: f64 = 1e30;

/// Builds the signed distance map of a binary mask.
///
/// A voxel is inside the mask when its value exceeds `threshold`. Inside
/// voxels receive the negated distance to the nearest outside voxel,
/// outside voxels the distance to the nearest inside voxel, both in
/// physical units.
pub fn signed_distance_map<const D: usize>(mask: &Volume<D>, threshold: f32) -> Volume<D> {
    let geom = *mask.geometry();
    let inside: Vec<bool> = mask.data().iter().map(|&v| v > threshold).collect();

    let to_inside = squared_edt(&geom, |i| inside[i]);
    let to_outside = squared_edt(&geom, |i| !inside[i]);

    let mut out = Volume::filled(geom, 0.0);
    for (linear, slot) in out.data_mut().iter_mut().enumerate() {
        *slot = if inside[linear] {
            -(to_outside[linear].sqrt() as f32)
        } else {
            to_inside[linear].sqrt() as f32
        };
    }
    out
}

/// Squared Euclidean distance from every voxel to the nearest site voxel.
fn squared_edt<const D: usize>(geom: &Geometry<D>, is_site: impl Fn(usize) -> bool) -> Vec<f64> {
    let total = geom.num_voxels();
    let mut dist: Vec<f64> = (0..total)
        .map(|i| if is_site(i) { 0.0 } else { FAR })
        .collect();

    let size = geom.size();
    let spacing = geom.spacing();
    let strides = geom.strides();

    let mut line = vec![0.0f64; *size.iter().max().unwrap_or(&1)];
    let mut out = vec![0.0f64; line.len()];
    let mut hull = vec![0usize; line.len()];
    let mut bounds = vec![0.0f64; line.len() + 1];

    for axis in 0..D {
        let n = size[axis];
        if n == 1 {
            continue;
        }
        let stride = strides[axis];
        for base in 0..total {
            if geom.index_at(base)[axis] != 0 {
                continue;
            }
            for q in 0..n {
                line[q] = dist[base + q * stride];
            }
            dt_line(&line[..n], spacing[axis], &mut out, &mut hull, &mut bounds);
            for q in 0..n {
                dist[base + q * stride] = out[q];
            }
        }
    }
    dist
}

/// One-dimensional squared distance transform along a line with sample
/// spacing `h`: `out[q] = min_p ((q - p)^2 h^2 + f[p])`.
fn dt_line(f: &[f64], h: f64, out: &mut [f64], hull: &mut [usize], bounds: &mut [f64]) {
    let n = f.len();
    let h2 = h * h;
    let mut k = 0usize;
    hull[0] = 0;
    bounds[0] = f64::NEG_INFINITY;
    bounds[1] = f64::INFINITY;

    for q in 1..n {
        let qf = q as f64;
        loop {
            let p = hull[k];
            let pf = p as f64;
            // Abscissa where parabola q overtakes parabola p.
            let s = ((f[q] + qf * qf * h2) - (f[p] + pf * pf * h2)) / (2.0 * h2 * (qf - pf));
            if s <= bounds[k] {
                debug_assert!(k > 0);
                k -= 1;
            } else {
                k += 1;
                hull[k] = q;
                bounds[k] = s;
                bounds[k + 1] = f64::INFINITY;
                break;
            }
        }
    }

    let mut k = 0usize;
    for (q, slot) in out.iter_mut().enumerate().take(n) {
        let qf = q as f64;
        while bounds[k + 1] < qf {
            k += 1;
        }
        let pf = hull[k] as f64;
        *slot = (qf - pf) * (qf - pf) * h2 + f[hull[k]];
    }
}
