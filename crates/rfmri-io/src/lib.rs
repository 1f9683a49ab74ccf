pub mod filename;
pub mod hdf5_io;
pub mod mgh;
pub mod nifti_io;

pub use filename::split_filename;
pub use hdf5_io::{extract_mgh_from_hdf5, read_hdf5, write_hdf5};
pub use mgh::{read_mgh, write_mgh, MghHeader};
pub use nifti_io::{read_cmap, read_nifti, write_cmap, write_nifti};
