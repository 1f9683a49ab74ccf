//! Resampling volumes through a coordinate mapping.
//!
//! This is the consumer side of a cmap: every output voxel looks up its
//! stored source coordinate and samples the input volume there.

use ndarray::{Array3, Array4, ArrayView3, Axis, Ix3, Ix4, Zip};

use crate::cmap::CoordinateMapping;
use crate::error::{CoreError, Result};
use crate::interpolation::{Interpolator, LinearInterpolator, NearestInterpolator};
use crate::volume::Volume;

/// Interpolation scheme for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Trilinear interpolation.
    Linear,
    /// Nearest-neighbour interpolation.
    Nearest,
}

/// Out-of-grid handling for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Samples outside the source grid become zero.
    Zero,
    /// Samples outside the source grid clamp to the border value.
    Closest,
    /// Samples outside the source grid become the volume maximum.
    Max,
}

/// Resample a 3D or 4D volume through a coordinate mapping.
///
/// The output grid and affine come from the cmap. 4D volumes are warped
/// frame by frame with the same mapping. The volume's header is carried
/// through unchanged.
pub fn apply_coordinate_mapping(
    volume: &Volume,
    cmap: &CoordinateMapping,
    interpolation: Interpolation,
    padding: Padding,
) -> Result<Volume> {
    let data = match volume.ndim() {
        3 => {
            let view = volume
                .data()
                .view()
                .into_dimensionality::<Ix3>()
                .expect("checked 3D");
            warp_frame(&view, cmap, interpolation, padding).into_dyn()
        }
        4 => {
            let view = volume
                .data()
                .view()
                .into_dimensionality::<Ix4>()
                .expect("checked 4D");
            let frames = view.shape()[3];
            let grid = cmap.grid_shape();
            let mut out = Array4::<f32>::zeros((grid[0], grid[1], grid[2], frames));
            for t in 0..frames {
                let frame = view.index_axis(Axis(3), t);
                out.index_axis_mut(Axis(3), t)
                    .assign(&warp_frame(&frame, cmap, interpolation, padding));
            }
            out.into_dyn()
        }
        n => {
            return Err(CoreError::dimension_mismatch(format!(
                "can only resample 3D or 4D volumes, got {} dimensions",
                n
            )))
        }
    };

    Ok(Volume::from_parts(
        data,
        *cmap.affine(),
        volume.header().clone(),
    ))
}

fn warp_frame(
    frame: &ArrayView3<f32>,
    cmap: &CoordinateMapping,
    interpolation: Interpolation,
    padding: Padding,
) -> Array3<f32> {
    match interpolation {
        Interpolation::Linear => warp_with(frame, cmap, &LinearInterpolator::new(), padding),
        Interpolation::Nearest => warp_with(frame, cmap, &NearestInterpolator::new(), padding),
    }
}

fn warp_with<I: Interpolator + Sync>(
    frame: &ArrayView3<f32>,
    cmap: &CoordinateMapping,
    interpolator: &I,
    padding: Padding,
) -> Array3<f32> {
    let dims = frame.dim();
    let dims = [dims.0, dims.1, dims.2];
    let grid = cmap.grid_shape();
    let fill = match padding {
        Padding::Zero => 0.0,
        Padding::Closest => 0.0, // unused, samples are clamped instead
        Padding::Max => frame.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)),
    };

    let mut out = Array3::<f32>::zeros((grid[0], grid[1], grid[2]));
    Zip::indexed(&mut out).par_for_each(|(i, j, k), o| {
        let coord = cmap.coordinate([i, j, k]);
        let inside = coord
            .iter()
            .zip(dims.iter())
            .all(|(&c, &d)| c >= 0.0 && c <= (d - 1) as f32);
        *o = if inside || padding == Padding::Closest {
            interpolator.sample(frame, coord)
        } else {
            fill
        };
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Affine;
    use ndarray::{Array4, ArrayD};

    fn ramp_volume(dims: [usize; 3]) -> Volume {
        let data = ArrayD::from_shape_fn(vec![dims[0], dims[1], dims[2]], |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f32
        });
        Volume::new(data)
    }

    #[test]
    fn test_identity_mapping_returns_input_linear() {
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 0, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)
            .unwrap();
        assert_eq!(out.data(), volume.data());
    }

    #[test]
    fn test_identity_mapping_returns_input_nearest() {
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 0, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Nearest, Padding::Zero)
            .unwrap();
        assert_eq!(out.data(), volume.data());
    }

    #[test]
    fn test_padded_mapping_zero_fill() {
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 1, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)
            .unwrap();
        assert_eq!(out.shape(), &[6, 6, 6]);
        // Border voxels sample outside the source grid.
        assert_eq!(out.data()[[0, 0, 0]], 0.0);
        // Interior voxels reproduce the input.
        assert_eq!(out.data()[[1, 1, 1]], volume.data()[[0, 0, 0]]);
        assert_eq!(out.data()[[4, 3, 2]], volume.data()[[3, 2, 1]]);
    }

    #[test]
    fn test_padded_mapping_closest_fill() {
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 1, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Nearest, Padding::Closest)
            .unwrap();
        // The border clamps to the nearest source voxel.
        assert_eq!(out.data()[[0, 0, 0]], volume.data()[[0, 0, 0]]);
        assert_eq!(out.data()[[5, 5, 5]], volume.data()[[3, 3, 3]]);
    }

    #[test]
    fn test_padded_mapping_max_fill() {
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 1, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Nearest, Padding::Max)
            .unwrap();
        assert_eq!(out.data()[[0, 0, 0]], 333.0);
    }

    #[test]
    fn test_4d_warped_frame_by_frame() {
        let mut data = Array4::<f32>::zeros((3, 3, 3, 2));
        data[[1, 1, 1, 0]] = 5.0;
        data[[1, 1, 1, 1]] = 7.0;
        let volume = Volume::new(data.into_dyn());
        let cmap = CoordinateMapping::identity([3, 3, 3], 0, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)
            .unwrap();
        assert_eq!(out.shape(), &[3, 3, 3, 2]);
        assert_eq!(out.data()[[1, 1, 1, 0]], 5.0);
        assert_eq!(out.data()[[1, 1, 1, 1]], 7.0);
    }

    #[test]
    fn test_2d_volume_rejected() {
        let volume = Volume::new(ArrayD::zeros(vec![4, 4]));
        let cmap = CoordinateMapping::identity([4, 4, 4], 0, &Affine::identity());
        let err = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero);
        assert!(err.is_err());
    }

    #[test]
    fn test_output_takes_cmap_affine() {
        let affine = Affine::from_rows([
            [2.0, 0.0, 0.0, 5.0],
            [0.0, 2.0, 0.0, 5.0],
            [0.0, 0.0, 2.0, 5.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let volume = ramp_volume([4, 4, 4]);
        let cmap = CoordinateMapping::identity([4, 4, 4], 0, &affine);
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)
            .unwrap();
        assert_eq!(out.affine(), cmap.affine());
    }
}
