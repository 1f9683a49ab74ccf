//! Cropping of coordinate mappings.

use ndarray::s;

use crate::cmap::CoordinateMapping;
use crate::error::{CoreError, Result};

impl CoordinateMapping {
    /// Crop to the bounding box of assigned voxels.
    ///
    /// A `margin` of extra voxels is kept around the box where the grid
    /// allows. The affine is shifted by the crop offset so world
    /// coordinates are unchanged.
    ///
    /// Fails if the mapping contains no assigned voxel.
    pub fn cropped(&self, margin: usize) -> Result<CoordinateMapping> {
        let dims = self.grid_shape();
        let mut lo = [usize::MAX; 3];
        let mut hi = [0usize; 3];
        let mut any = false;

        for i in 0..dims[0] {
            for j in 0..dims[1] {
                for k in 0..dims[2] {
                    if self.is_assigned([i, j, k]) {
                        any = true;
                        let v = [i, j, k];
                        for a in 0..3 {
                            lo[a] = lo[a].min(v[a]);
                            hi[a] = hi[a].max(v[a]);
                        }
                    }
                }
            }
        }

        if !any {
            return Err(CoreError::empty_mapping(
                "cannot crop a mapping with no assigned voxels",
            ));
        }

        for a in 0..3 {
            lo[a] = lo[a].saturating_sub(margin);
            hi[a] = (hi[a] + margin).min(dims[a] - 1);
        }

        let data = self
            .data()
            .slice(s![lo[0]..=hi[0], lo[1]..=hi[1], lo[2]..=hi[2], ..])
            .to_owned();
        let affine = self
            .affine()
            .translated_by_voxels([lo[0] as f64, lo[1] as f64, lo[2] as f64]);

        CoordinateMapping::new(data, affine)
    }
}
