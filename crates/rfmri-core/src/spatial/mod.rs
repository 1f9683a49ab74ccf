//! Spatial types for voxel-to-world geometry.
//!
//! All types are based on nalgebra for efficient linear algebra
//! operations.

pub mod affine;

pub use affine::Affine;
