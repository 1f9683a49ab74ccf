//! Nearest-neighbour interpolation.

use ndarray::ArrayView3;

use super::trait_::Interpolator;

/// Nearest-neighbour interpolator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestInterpolator;

impl NearestInterpolator {
    /// Create a new nearest-neighbour interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl Interpolator for NearestInterpolator {
    fn sample(&self, data: &ArrayView3<f32>, coord: [f32; 3]) -> f32 {
        let dims = data.dim();
        let dims = [dims.0, dims.1, dims.2];
        let clamp = |v: f32, d: usize| -> usize { (v.round().max(0.0) as usize).min(d - 1) };
        data[[
            clamp(coord[0], dims[0]),
            clamp(coord[1], dims[1]),
            clamp(coord[2], dims[2]),
        ]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_rounds_to_nearest() {
        let data = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| {
            (i * 100 + j * 10 + k) as f32
        });
        let interp = NearestInterpolator::new();
        assert_eq!(interp.sample(&data.view(), [0.4, 1.6, 2.2]), 22.0);
        assert_eq!(interp.sample(&data.view(), [1.5, 0.0, 0.0]), 200.0);
    }

    #[test]
    fn test_clamps_outside_grid() {
        let data = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| {
            (i * 100 + j * 10 + k) as f32
        });
        let interp = NearestInterpolator::new();
        assert_eq!(interp.sample(&data.view(), [-3.0, 0.0, 0.0]), 0.0);
        assert_eq!(interp.sample(&data.view(), [9.0, 9.0, 9.0]), 222.0);
    }
}
