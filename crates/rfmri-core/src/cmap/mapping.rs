//! The dense coordinate-mapping type.

use ndarray::{Array4, ArrayD, Axis};

use crate::error::{CoreError, Result};
use crate::spatial::Affine;
use crate::volume::{Volume, VolumeHeader};

/// Dense per-voxel coordinate mapping.
///
/// The field has shape X x Y x Z x 3; each voxel stores the corresponding
/// location in another image's voxel grid. A voxel whose three components
/// are all zero is unassigned (background). The affine places the cmap's
/// own grid in world space.
#[derive(Debug, Clone)]
pub struct CoordinateMapping {
    data: Array4<f32>,
    affine: Affine,
}

impl CoordinateMapping {
    /// Create a coordinate mapping from a 4D array.
    ///
    /// Fails unless the last axis has length 3.
    pub fn new(data: Array4<f32>, affine: Affine) -> Result<Self> {
        if data.shape()[3] != 3 {
            return Err(CoreError::dimension_mismatch(format!(
                "coordinate mapping must have 3 components along the last axis, got {}",
                data.shape()[3]
            )));
        }
        Ok(Self { data, affine })
    }

    /// Create a coordinate mapping from a dynamic-dimensional array.
    ///
    /// Fails unless the array is 4D with a last axis of length 3.
    pub fn from_dyn(data: ArrayD<f32>, affine: Affine) -> Result<Self> {
        let data = data
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|_| CoreError::dimension_mismatch("coordinate mapping must be a 4D array"))?;
        Self::new(data, affine)
    }

    /// Create the identity mapping for a grid, with optional border padding.
    ///
    /// Voxel (i, j, k) of the padded grid stores (i - pad, j - pad, k - pad),
    /// so the mapping resamples a volume onto itself while the `pad` border
    /// reaches outside the source grid. The affine is shifted so world
    /// coordinates are unchanged by the padding.
    pub fn identity(shape: [usize; 3], pad: usize, affine: &Affine) -> Self {
        let dims = (
            shape[0] + 2 * pad,
            shape[1] + 2 * pad,
            shape[2] + 2 * pad,
            3,
        );
        let data = Array4::from_shape_fn(dims, |(i, j, k, c)| {
            let index = match c {
                0 => i,
                1 => j,
                _ => k,
            };
            index as f32 - pad as f32
        });
        let affine = affine.translated_by_voxels([-(pad as f64); 3]);
        Self { data, affine }
    }

    /// Get the coordinate data.
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// Get mutable coordinate data.
    pub fn data_mut(&mut self) -> &mut Array4<f32> {
        &mut self.data
    }

    /// Get the affine of the cmap's own grid.
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// Get the spatial grid shape (without the component axis).
    pub fn grid_shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    /// The coordinate triplet stored at a grid voxel.
    pub fn coordinate(&self, index: [usize; 3]) -> [f32; 3] {
        [
            self.data[[index[0], index[1], index[2], 0]],
            self.data[[index[0], index[1], index[2], 1]],
            self.data[[index[0], index[1], index[2], 2]],
        ]
    }

    /// Whether the voxel at `index` is assigned (any nonzero component).
    pub fn is_assigned(&self, index: [usize; 3]) -> bool {
        self.coordinate(index).iter().any(|&c| c != 0.0)
    }

    /// Replicate the field across a leading-of-last time axis.
    ///
    /// Returns a 5D array of shape X x Y x Z x frames x 3 for consumers
    /// that expect one mapping per time point.
    pub fn to_frames(&self, frames: usize) -> ArrayD<f32> {
        let mut out = ArrayD::<f32>::zeros(vec![
            self.data.shape()[0],
            self.data.shape()[1],
            self.data.shape()[2],
            frames,
            3,
        ]);
        for t in 0..frames {
            out.index_axis_mut(Axis(3), t).assign(&self.data);
        }
        out
    }

    /// Convert into a 4D volume for writing to disk.
    pub fn into_volume(self) -> Volume {
        Volume::from_parts(self.data.into_dyn(), self.affine, VolumeHeader::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_no_padding() {
        let cmap = CoordinateMapping::identity([4, 5, 6], 0, &Affine::identity());
        assert_eq!(cmap.grid_shape(), [4, 5, 6]);
        assert_eq!(cmap.coordinate([2, 3, 4]), [2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_identity_with_padding() {
        let cmap = CoordinateMapping::identity([4, 4, 4], 2, &Affine::identity());
        assert_eq!(cmap.grid_shape(), [8, 8, 8]);
        // The border voxel points outside the source grid.
        assert_eq!(cmap.coordinate([0, 0, 0]), [-2.0, -2.0, -2.0]);
        // The padded voxel (2,2,2) is the source origin.
        assert_eq!(cmap.coordinate([2, 2, 2]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identity_padding_keeps_world_coordinates() {
        let affine = Affine::from_rows([
            [0.8, 0.0, 0.0, -50.0],
            [0.0, 0.8, 0.0, -60.0],
            [0.0, 0.0, 0.8, -30.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let plain = CoordinateMapping::identity([4, 4, 4], 0, &affine);
        let padded = CoordinateMapping::identity([4, 4, 4], 1, &affine);
        let a = plain.affine().apply([0.0, 0.0, 0.0]);
        let b = padded.affine().apply([1.0, 1.0, 1.0]);
        assert!((a[0] - b[0]).abs() < 1e-9);
        assert!((a[1] - b[1]).abs() < 1e-9);
        assert!((a[2] - b[2]).abs() < 1e-9);
    }

    #[test]
    fn test_last_axis_enforced() {
        let data = Array4::<f32>::zeros((3, 3, 3, 4));
        assert!(CoordinateMapping::new(data, Affine::identity()).is_err());
    }

    #[test]
    fn test_from_dyn_rejects_3d() {
        let data = ArrayD::<f32>::zeros(vec![3, 3, 3]);
        assert!(CoordinateMapping::from_dyn(data, Affine::identity()).is_err());
    }

    #[test]
    fn test_to_frames() {
        let cmap = CoordinateMapping::identity([2, 2, 2], 0, &Affine::identity());
        let frames = cmap.to_frames(3);
        assert_eq!(frames.shape(), &[2, 2, 2, 3, 3]);
        assert_eq!(frames[[1, 0, 1, 2, 0]], 1.0);
        assert_eq!(frames[[1, 0, 1, 2, 2]], 1.0);
    }
}
