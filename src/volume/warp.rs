//! Resampling a volume through a displacement field.

use crate::util::{DemonsError, DemonsResult};
use crate::volume::interp::{sample_scalar, Interpolation};
use crate::volume::{VectorField, Volume};

/// Warps `vol` through `field`: output voxel `x` is `vol` sampled at the
/// physical position `x + field(x)`.
///
/// Positions mapping outside the volume's domain receive `fill`. The
/// moving-image warp passes [`Volume::SENTINEL`] so downstream consumers
/// can recognize unmapped voxels; mask warps pass `0.0` so out-of-domain
/// never reads as inside the mask.
pub fn warp<const D: usize>(
    vol: &Volume<D>,
    field: &VectorField<D>,
    interp: Interpolation,
    fill: f32,
) -> DemonsResult<Volume<D>> {
    if !vol.geometry().matches(field.geometry()) {
        return Err(DemonsError::GeometryMismatch {
            context: "displacement field",
        });
    }

    let geom = *field.geometry();
    let mut out = Volume::filled(geom, fill);
    for linear in 0..geom.num_voxels() {
        let index = geom.index_at(linear);
        let disp = field.get(linear);
        let mut point = geom.index_to_physical(index);
        for axis in 0..D {
            point[axis] += disp[axis] as f64;
        }
        let ci = vol.geometry().physical_to_continuous(point);
        if let Some(value) = sample_scalar(vol, ci, interp) {
            out.data_mut()[linear] = value;
        }
    }
    Ok(out)
}
