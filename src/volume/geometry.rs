//! Regular-grid geometry: per-axis size, spacing and origin.
//!
//! Axis 0 is the fastest-varying axis in memory. Physical coordinates are
//! `origin + index * spacing` per axis; no direction matrix is modeled, the
//! grid axes are assumed aligned with the physical axes.

use crate::util::{DemonsError, DemonsResult};

/// Tolerance for treating two spacings or origins as equal.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// Grid geometry shared by volumes and vector fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry<const D: usize> {
    size: [usize; D],
    spacing: [f64; D],
    origin: [f64; D],
}

impl<const D: usize> Geometry<D> {
    /// Creates a geometry, rejecting zero-length axes and non-positive
    /// spacing.
    pub fn new(size: [usize; D], spacing: [f64; D], origin: [f64; D]) -> DemonsResult<Self> {
        if size.iter().any(|&s| s == 0) {
            return Err(DemonsError::EmptyVolume);
        }
        if let Some(&bad) = spacing.iter().find(|&&s| !(s > 0.0)) {
            return Err(DemonsError::InvalidParameter {
                name: "spacing",
                value: bad,
            });
        }
        Ok(Self {
            size,
            spacing,
            origin,
        })
    }

    /// Creates a unit-spacing geometry with the origin at zero.
    pub fn isotropic(size: [usize; D]) -> DemonsResult<Self> {
        Self::new(size, [1.0; D], [0.0; D])
    }

    /// Returns the per-axis sample counts.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Returns the per-axis physical spacing.
    pub fn spacing(&self) -> [f64; D] {
        self.spacing
    }

    /// Returns the physical position of index zero.
    pub fn origin(&self) -> [f64; D] {
        self.origin
    }

    /// Total number of voxels in the grid.
    pub fn num_voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// Linear strides per axis, axis 0 fastest.
    pub fn strides(&self) -> [usize; D] {
        let mut strides = [1usize; D];
        for axis in 1..D {
            strides[axis] = strides[axis - 1] * self.size[axis - 1];
        }
        strides
    }

    /// Linear offset of a multi-index. Indices must be within the grid.
    #[inline]
    pub fn linear(&self, index: [usize; D]) -> usize {
        let strides = self.strides();
        let mut offset = 0;
        for axis in 0..D {
            debug_assert!(index[axis] < self.size[axis]);
            offset += index[axis] * strides[axis];
        }
        offset
    }

    /// Multi-index of a linear offset.
    #[inline]
    pub fn index_at(&self, mut linear: usize) -> [usize; D] {
        let mut index = [0usize; D];
        for axis in 0..D {
            index[axis] = linear % self.size[axis];
            linear /= self.size[axis];
        }
        index
    }

    /// Physical position of a voxel index.
    #[inline]
    pub fn index_to_physical(&self, index: [usize; D]) -> [f64; D] {
        let mut point = [0.0; D];
        for axis in 0..D {
            point[axis] = self.origin[axis] + index[axis] as f64 * self.spacing[axis];
        }
        point
    }

    /// Continuous (fractional) index of a physical position.
    #[inline]
    pub fn physical_to_continuous(&self, point: [f64; D]) -> [f64; D] {
        let mut ci = [0.0; D];
        for axis in 0..D {
            ci[axis] = (point[axis] - self.origin[axis]) / self.spacing[axis];
        }
        ci
    }

    /// Whether a continuous index lies within the sampled domain.
    #[inline]
    pub fn contains_continuous(&self, ci: [f64; D]) -> bool {
        (0..D).all(|axis| ci[axis] >= 0.0 && ci[axis] <= (self.size[axis] - 1) as f64)
    }

    /// Mean of the per-axis spacings.
    pub fn mean_spacing(&self) -> f64 {
        self.spacing.iter().sum::<f64>() / D as f64
    }

    /// Whether two geometries describe the same grid, within tolerance on
    /// spacing and origin.
    pub fn matches(&self, other: &Self) -> bool {
        self.size == other.size
            && (0..D).all(|axis| {
                (self.spacing[axis] - other.spacing[axis]).abs() <= GEOMETRY_TOLERANCE
                    && (self.origin[axis] - other.origin[axis]).abs() <= GEOMETRY_TOLERANCE
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Geometry;
    use crate::util::DemonsError;

    #[test]
    fn rejects_zero_axis() {
        let result = Geometry::new([4, 0], [1.0, 1.0], [0.0, 0.0]);
        assert!(matches!(result, Err(DemonsError::EmptyVolume)));
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let result = Geometry::new([4, 4], [1.0, -0.5], [0.0, 0.0]);
        assert!(matches!(
            result,
            Err(DemonsError::InvalidParameter { name: "spacing", .. })
        ));
    }

    #[test]
    fn linear_and_index_at_round_trip() {
        let geom = Geometry::isotropic([3, 4, 5]).unwrap();
        for linear in 0..geom.num_voxels() {
            assert_eq!(geom.linear(geom.index_at(linear)), linear);
        }
    }

    #[test]
    fn strides_follow_axis_order() {
        let geom = Geometry::isotropic([3, 4, 5]).unwrap();
        assert_eq!(geom.strides(), [1, 3, 12]);
    }

    #[test]
    fn physical_mapping_uses_spacing_and_origin() {
        let geom = Geometry::new([4, 4], [2.0, 0.5], [10.0, -1.0]).unwrap();
        let point = geom.index_to_physical([2, 2]);
        assert_eq!(point, [14.0, 0.0]);
        let ci = geom.physical_to_continuous(point);
        assert!((ci[0] - 2.0).abs() < 1e-12);
        assert!((ci[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn containment_is_inclusive_at_the_last_sample() {
        let geom = Geometry::isotropic([4, 4]).unwrap();
        assert!(geom.contains_continuous([3.0, 3.0]));
        assert!(!geom.contains_continuous([3.0001, 0.0]));
        assert!(!geom.contains_continuous([-0.0001, 0.0]));
    }

    #[test]
    fn matches_tolerates_tiny_metadata_noise() {
        let a = Geometry::new([4, 4], [1.0, 1.0], [0.0, 0.0]).unwrap();
        let b = Geometry::new([4, 4], [1.0 + 1e-9, 1.0], [0.0, -1e-9]).unwrap();
        let c = Geometry::new([4, 5], [1.0, 1.0], [0.0, 0.0]).unwrap();
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }
}
