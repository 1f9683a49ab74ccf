//! Interpolation types and operations.
//!
//! This module provides the interpolator trait and implementations for
//! sampling volumes at continuous voxel coordinates.

pub mod trait_;
pub mod linear;
pub mod nearest;

pub use trait_::Interpolator;
pub use linear::LinearInterpolator;
pub use nearest::NearestInterpolator;
