//! Trilinear interpolation.

use ndarray::ArrayView3;

use super::trait_::Interpolator;

/// Linear interpolator.
///
/// Performs trilinear interpolation over the eight surrounding voxels.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl Interpolator for LinearInterpolator {
    fn sample(&self, data: &ArrayView3<f32>, coord: [f32; 3]) -> f32 {
        let dims = data.dim();
        let dims = [dims.0, dims.1, dims.2];

        // Floor coordinates and interpolation weights.
        let x0 = coord[0].floor();
        let y0 = coord[1].floor();
        let z0 = coord[2].floor();
        let wx = coord[0] - x0;
        let wy = coord[1] - y0;
        let wz = coord[2] - z0;

        // Clamp corner indices to the valid range.
        let clamp = |v: f32, d: usize| -> usize { (v.max(0.0) as usize).min(d - 1) };
        let x0i = clamp(x0, dims[0]);
        let y0i = clamp(y0, dims[1]);
        let z0i = clamp(z0, dims[2]);
        let x1i = clamp(x0 + 1.0, dims[0]);
        let y1i = clamp(y0 + 1.0, dims[1]);
        let z1i = clamp(z0 + 1.0, dims[2]);

        // Gather the eight corner values.
        let v000 = data[[x0i, y0i, z0i]];
        let v001 = data[[x0i, y0i, z1i]];
        let v010 = data[[x0i, y1i, z0i]];
        let v011 = data[[x0i, y1i, z1i]];
        let v100 = data[[x1i, y0i, z0i]];
        let v101 = data[[x1i, y0i, z1i]];
        let v110 = data[[x1i, y1i, z0i]];
        let v111 = data[[x1i, y1i, z1i]];

        // Interpolate along x, then y, then z.
        let c00 = v000 * (1.0 - wx) + v100 * wx;
        let c01 = v001 * (1.0 - wx) + v101 * wx;
        let c10 = v010 * (1.0 - wx) + v110 * wx;
        let c11 = v011 * (1.0 - wx) + v111 * wx;

        let c0 = c00 * (1.0 - wy) + c10 * wy;
        let c1 = c01 * (1.0 - wy) + c11 * wy;

        c0 * (1.0 - wz) + c1 * wz
    }
}
