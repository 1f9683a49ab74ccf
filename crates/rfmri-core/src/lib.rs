pub mod cmap;
pub mod error;
pub mod filter;
pub mod interpolation;
pub mod resample;
pub mod spatial;
pub mod stats;
pub mod volume;

pub use cmap::CoordinateMapping;
pub use error::{CoreError, Result};
pub use spatial::Affine;
pub use volume::{Volume, VolumeHeader};
