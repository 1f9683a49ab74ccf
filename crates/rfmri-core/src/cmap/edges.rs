//! Removal of interpolation-smeared edges from a coordinate mapping.

use crate::cmap::CoordinateMapping;

impl CoordinateMapping {
    /// Zero out voxels with discontinuous coordinates.
    ///
    /// When a mapping that covers only a slab is resampled into a larger
    /// volume, interpolation smears its borders: voxels just outside the
    /// slab blend valid coordinates with background zeros. A voxel is
    /// removed when any coordinate component jumps by more than
    /// `edge_threshold` to a 6-neighbour, and afterwards when the largest
    /// component magnitude stays below `min_threshold` (values that close
    /// to the grid corner are blended background).
    pub fn edges_removed(&self, edge_threshold: f32, min_threshold: f32) -> CoordinateMapping {
        let dims = self.grid_shape();
        let mut data = self.data().clone();

        for i in 0..dims[0] {
            for j in 0..dims[1] {
                for k in 0..dims[2] {
                    if !self.is_assigned([i, j, k]) {
                        continue;
                    }
                    let here = self.coordinate([i, j, k]);
                    if self.has_jump([i, j, k], here, edge_threshold)
                        || here.iter().all(|c| c.abs() < min_threshold)
                    {
                        for c in 0..3 {
                            data[[i, j, k, c]] = 0.0;
                        }
                    }
                }
            }
        }

        CoordinateMapping::new(data, *self.affine())
            .expect("edge removal preserves the component axis")
    }

    fn has_jump(&self, voxel: [usize; 3], here: [f32; 3], edge_threshold: f32) -> bool {
        let dims = self.grid_shape();
        for axis in 0..3 {
            for dir in [-1i64, 1] {
                let mut n = [voxel[0] as i64, voxel[1] as i64, voxel[2] as i64];
                n[axis] += dir;
                let inside = n
                    .iter()
                    .zip(dims.iter())
                    .all(|(&x, &d)| x >= 0 && (x as usize) < d);
                if !inside {
                    continue;
                }
                let n = [n[0] as usize, n[1] as usize, n[2] as usize];
                if !self.is_assigned(n) {
                    continue;
                }
                let there = self.coordinate(n);
                for c in 0..3 {
                    if (here[c] - there[c]).abs() > edge_threshold {
                        return true;
                    }
                }
            }
        }
        false
    }
}
