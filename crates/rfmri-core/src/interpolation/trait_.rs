//! Interpolator trait.

use ndarray::ArrayView3;

/// Samples a 3D volume at a continuous voxel coordinate.
///
/// Coordinates are in voxel units of the sampled volume. Implementations
/// clamp corner fetches at the volume border; deciding what happens for
/// coordinates outside the grid altogether is the caller's padding policy.
pub trait Interpolator {
    /// Sample `data` at the continuous coordinate `coord`.
    fn sample(&self, data: &ArrayView3<f32>, coord: [f32; 3]) -> f32;
}
