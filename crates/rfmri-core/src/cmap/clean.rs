//! Removal of unreachable voxels from a coordinate mapping.

use ndarray::Array3;

use crate::cmap::CoordinateMapping;

/// Clean a target mapping against hits from a source mapping.
///
/// Every assigned voxel of `source` points at a location in the grid of
/// `target`; the nearest voxel to each such location is marked as hit.
/// Target voxels never hit are zeroed out, since no source voxel ever
/// lands on them and their coordinates are interpolation artifacts.
///
/// Returns the cleaned mapping together with the binary hit mask.
pub fn clean_coordinate_mapping(
    source: &CoordinateMapping,
    target: &CoordinateMapping,
) -> (CoordinateMapping, Array3<u8>) {
    let tdims = target.grid_shape();
    let sdims = source.grid_shape();
    let mut mask = Array3::<u8>::zeros((tdims[0], tdims[1], tdims[2]));

    for i in 0..sdims[0] {
        for j in 0..sdims[1] {
            for k in 0..sdims[2] {
                if !source.is_assigned([i, j, k]) {
                    continue;
                }
                let c = source.coordinate([i, j, k]);
                let hit = [
                    c[0].round() as i64,
                    c[1].round() as i64,
                    c[2].round() as i64,
                ];
                let inside = hit
                    .iter()
                    .zip(tdims.iter())
                    .all(|(&h, &d)| h >= 0 && (h as usize) < d);
                if inside {
                    mask[[hit[0] as usize, hit[1] as usize, hit[2] as usize]] = 1;
                }
            }
        }
    }

    let mut data = target.data().clone();
    for i in 0..tdims[0] {
        for j in 0..tdims[1] {
            for k in 0..tdims[2] {
                if mask[[i, j, k]] == 0 {
                    for c in 0..3 {
                        data[[i, j, k, c]] = 0.0;
                    }
                }
            }
        }
    }

    let cleaned = CoordinateMapping::new(data, *target.affine())
        .expect("cleaning preserves the component axis");
    (cleaned, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Affine;
    use ndarray::Array4;

    #[test]
    fn test_clean_keeps_hit_voxels() {
        // Source: a single voxel pointing near target voxel (2, 2, 2).
        let mut sdata = Array4::<f32>::zeros((2, 2, 2, 3));
        sdata[[0, 0, 0, 0]] = 2.2;
        sdata[[0, 0, 0, 1]] = 1.8;
        sdata[[0, 0, 0, 2]] = 2.0;
        let source = CoordinateMapping::new(sdata, Affine::identity()).unwrap();

        // Target grid is 5^3 (a padded identity mapping).
        let target = CoordinateMapping::identity([3, 3, 3], 1, &Affine::identity());

        let (cleaned, mask) = clean_coordinate_mapping(&source, &target);
        assert_eq!(mask[[2, 2, 2]], 1);
        assert_eq!(mask.iter().map(|&m| m as usize).sum::<usize>(), 1);
        // The hit voxel keeps its coordinates, every other voxel is zeroed.
        assert_eq!(cleaned.coordinate([2, 2, 2]), [1.0, 1.0, 1.0]);
        assert_eq!(cleaned.coordinate([0, 1, 2]), [0.0, 0.0, 0.0]);
        assert_eq!(cleaned.coordinate([3, 2, 2]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clean_ignores_out_of_grid_hits() {
        let mut sdata = Array4::<f32>::zeros((2, 2, 2, 3));
        sdata[[0, 0, 0, 0]] = 50.0;
        sdata[[0, 0, 0, 1]] = 50.0;
        sdata[[0, 0, 0, 2]] = 50.0;
        let source = CoordinateMapping::new(sdata, Affine::identity()).unwrap();
        let target = CoordinateMapping::identity([3, 3, 3], 1, &Affine::identity());

        let (_, mask) = clean_coordinate_mapping(&source, &target);
        assert_eq!(mask.iter().map(|&m| m as usize).sum::<usize>(), 0);
    }

    #[test]
    fn test_clean_empty_source_zeroes_everything() {
        let sdata = Array4::<f32>::zeros((2, 2, 2, 3));
        let source = CoordinateMapping::new(sdata, Affine::identity()).unwrap();
        let target = CoordinateMapping::identity([3, 3, 3], 1, &Affine::identity());

        let (cleaned, mask) = clean_coordinate_mapping(&source, &target);
        assert_eq!(mask.iter().map(|&m| m as usize).sum::<usize>(), 0);
        assert!(cleaned.data().iter().all(|&v| v == 0.0));
    }
}
