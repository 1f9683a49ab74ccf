//! Coordinate mappings (deformation fields).
//!
//! A coordinate mapping stores, for every voxel of one grid, the
//! corresponding voxel-grid location in another image. Resampling a
//! volume through a cmap warps it between the two spaces.

pub mod clean;
pub mod crop;
pub mod edges;
pub mod expand;
pub mod mapping;

pub use clean::clean_coordinate_mapping;
pub use mapping::CoordinateMapping;
