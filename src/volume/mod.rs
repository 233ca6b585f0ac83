//! Scalar volumes and displacement vector fields on regular grids.
//!
//! Both containers own their sample buffer and carry a [`Geometry`]
//! describing the grid. Axis 0 is the fastest-varying axis. `D` is the
//! grid dimensionality (2 or 3 in practice).

use crate::util::{DemonsError, DemonsResult};

pub mod distance;
pub mod geometry;
pub mod interp;
pub mod warp;

pub use geometry::Geometry;

/// Scalar volume: a regular grid of `f32` samples.
#[derive(Clone, Debug)]
pub struct Volume<const D: usize> {
    geom: Geometry<D>,
    data: Vec<f32>,
}

impl<const D: usize> Volume<D> {
    /// Reserved sample value marking an unmapped or saturated voxel.
    ///
    /// Warping fills out-of-domain samples with this value, and the force
    /// evaluator excludes any voxel carrying it. Genuine image intensities
    /// must never equal it; callers with data touching `f32::MAX` must
    /// rescale first. (An explicit validity mask would remove this hazard
    /// and may replace the convention in a future revision.)
    pub const SENTINEL: f32 = f32::MAX;

    /// Wraps a sample buffer, rejecting a length that disagrees with the
    /// geometry.
    pub fn new(geom: Geometry<D>, data: Vec<f32>) -> DemonsResult<Self> {
        let needed = geom.num_voxels();
        if data.len() != needed {
            return Err(DemonsError::BufferSizeMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { geom, data })
    }

    /// Creates a volume filled with a constant value.
    pub fn filled(geom: Geometry<D>, value: f32) -> Self {
        let data = vec![value; geom.num_voxels()];
        Self { geom, data }
    }

    /// Returns the grid geometry.
    pub fn geometry(&self) -> &Geometry<D> {
        &self.geom
    }

    /// Returns the sample at a linear offset.
    #[inline]
    pub fn get(&self, linear: usize) -> f32 {
        self.data[linear]
    }

    /// Returns the sample at a multi-index.
    #[inline]
    pub fn at(&self, index: [usize; D]) -> f32 {
        self.data[self.geom.linear(index)]
    }

    /// Sets the sample at a multi-index.
    #[inline]
    pub fn set(&mut self, index: [usize; D], value: f32) {
        let linear = self.geom.linear(index);
        self.data[linear] = value;
    }

    /// Returns the backing sample slice.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the backing sample slice mutably.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Vector field: a regular grid of D-dimensional displacement vectors.
///
/// Displacements are physical-space offsets in the same units as the grid
/// spacing.
#[derive(Clone, Debug)]
pub struct VectorField<const D: usize> {
    geom: Geometry<D>,
    data: Vec<[f32; D]>,
}

impl<const D: usize> VectorField<D> {
    /// Wraps a vector buffer, rejecting a length that disagrees with the
    /// geometry.
    pub fn new(geom: Geometry<D>, data: Vec<[f32; D]>) -> DemonsResult<Self> {
        let needed = geom.num_voxels();
        if data.len() != needed {
            return Err(DemonsError::BufferSizeMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { geom, data })
    }

    /// Creates an all-zero field.
    pub fn zeros(geom: Geometry<D>) -> Self {
        let data = vec![[0.0; D]; geom.num_voxels()];
        Self { geom, data }
    }

    /// Returns the grid geometry.
    pub fn geometry(&self) -> &Geometry<D> {
        &self.geom
    }

    /// Returns the vector at a linear offset.
    #[inline]
    pub fn get(&self, linear: usize) -> [f32; D] {
        self.data[linear]
    }

    /// Returns the vector at a multi-index.
    #[inline]
    pub fn at(&self, index: [usize; D]) -> [f32; D] {
        self.data[self.geom.linear(index)]
    }

    /// Sets the vector at a multi-index.
    #[inline]
    pub fn set(&mut self, index: [usize; D], value: [f32; D]) {
        let linear = self.geom.linear(index);
        self.data[linear] = value;
    }

    /// Returns the backing vector slice.
    pub fn data(&self) -> &[[f32; D]] {
        &self.data
    }

    /// Returns the backing vector slice mutably.
    pub fn data_mut(&mut self) -> &mut [[f32; D]] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, VectorField, Volume};
    use crate::util::DemonsError;

    #[test]
    fn volume_rejects_wrong_buffer_length() {
        let geom = Geometry::isotropic([2, 3]).unwrap();
        let result = Volume::new(geom, vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(DemonsError::BufferSizeMismatch { needed: 6, got: 5 })
        ));
    }

    #[test]
    fn volume_indexing_is_axis0_fastest() {
        let geom = Geometry::isotropic([2, 2]).unwrap();
        let vol = Volume::new(geom, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(vol.at([0, 0]), 1.0);
        assert_eq!(vol.at([1, 0]), 2.0);
        assert_eq!(vol.at([0, 1]), 3.0);
        assert_eq!(vol.at([1, 1]), 4.0);
    }

    #[test]
    fn field_zeros_has_matching_length() {
        let geom = Geometry::isotropic([3, 3, 3]).unwrap();
        let field = VectorField::<3>::zeros(geom);
        assert_eq!(field.data().len(), 27);
        assert_eq!(field.at([2, 2, 2]), [0.0; 3]);
    }
}
