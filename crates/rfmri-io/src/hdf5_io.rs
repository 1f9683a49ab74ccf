//! Reading and writing HDF5 files.
//!
//! The on-disk layout is a `data` dataset plus optional `affine` (4x4
//! f64) and `header` group (RAS geometry). Consumers substitute the
//! identity affine and an empty header when the optional parts are
//! missing.

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2, ArrayD, Axis};
use std::path::Path;

use crate::mgh::write_mgh;
use rfmri_core::{Affine, VolumeHeader};

/// Read an HDF5 file.
///
/// Returns the `data` array together with the affine and header when the
/// file carries them, `None` otherwise.
pub fn read_hdf5<P: AsRef<Path>>(
    path: P,
) -> Result<(ArrayD<f32>, Option<Affine>, Option<VolumeHeader>)> {
    let path = path.as_ref();
    let file = hdf5::File::open(path)
        .with_context(|| format!("Failed to open HDF5 file {}", path.display()))?;

    let data = file
        .dataset("data")
        .with_context(|| format!("{} has no 'data' dataset", path.display()))?
        .read_dyn::<f32>()
        .context("Failed to read 'data' dataset")?;

    let affine = match file.dataset("affine") {
        Ok(ds) => {
            let m = ds
                .read_2d::<f64>()
                .context("Failed to read 'affine' dataset")?;
            if m.dim() != (4, 4) {
                bail!("'affine' dataset must be 4x4, got {:?}", m.dim());
            }
            let mut rows = [[0.0f64; 4]; 4];
            for r in 0..4 {
                for c in 0..4 {
                    rows[r][c] = m[[r, c]];
                }
            }
            Some(Affine::from_rows(rows))
        }
        Err(_) => None,
    };

    let header = match file.group("header") {
        Ok(group) => {
            let delta = group
                .dataset("delta")?
                .read_1d::<f32>()
                .context("Failed to read header delta")?;
            let mdc = group
                .dataset("mdc")?
                .read_2d::<f32>()
                .context("Failed to read header mdc")?;
            let p_xyz_c = group
                .dataset("pxyz_c")?
                .read_1d::<f32>()
                .context("Failed to read header pxyz_c")?;
            let dof = group.dataset("dof")?.read_1d::<i32>()?;
            if delta.len() != 3 || mdc.dim() != (3, 3) || p_xyz_c.len() != 3 {
                bail!("header group has malformed geometry datasets");
            }
            let mut header = VolumeHeader {
                dof: dof.first().copied().unwrap_or(0),
                ras_good: true,
                delta: [delta[0], delta[1], delta[2]],
                mdc: [[0.0; 3]; 3],
                p_xyz_c: [p_xyz_c[0], p_xyz_c[1], p_xyz_c[2]],
            };
            for r in 0..3 {
                for c in 0..3 {
                    header.mdc[r][c] = mdc[[r, c]];
                }
            }
            Some(header)
        }
        Err(_) => None,
    };

    Ok((data, affine, header))
}

/// Write an HDF5 file in the layout `read_hdf5` expects.
pub fn write_hdf5<P: AsRef<Path>>(
    path: P,
    data: &ArrayD<f32>,
    affine: Option<&Affine>,
    header: Option<&VolumeHeader>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let file = hdf5::File::create(path)
        .with_context(|| format!("Failed to create HDF5 file {}", path.display()))?;

    file.new_dataset_builder()
        .with_data(data.view())
        .create("data")
        .context("Failed to write 'data' dataset")?;

    if let Some(affine) = affine {
        let rows = affine.to_rows();
        let mut m = Array2::<f64>::zeros((4, 4));
        for r in 0..4 {
            for c in 0..4 {
                m[[r, c]] = rows[r][c];
            }
        }
        file.new_dataset_builder()
            .with_data(m.view())
            .create("affine")
            .context("Failed to write 'affine' dataset")?;
    }

    if let Some(header) = header {
        let group = file
            .create_group("header")
            .context("Failed to create header group")?;
        group
            .new_dataset_builder()
            .with_data(&Array1::from(header.delta.to_vec()))
            .create("delta")?;
        let mut mdc = Array2::<f32>::zeros((3, 3));
        for r in 0..3 {
            for c in 0..3 {
                mdc[[r, c]] = header.mdc[r][c];
            }
        }
        group
            .new_dataset_builder()
            .with_data(mdc.view())
            .create("mdc")?;
        group
            .new_dataset_builder()
            .with_data(&Array1::from(header.p_xyz_c.to_vec()))
            .create("pxyz_c")?;
        group
            .new_dataset_builder()
            .with_data(&Array1::from(vec![header.dof]))
            .create("dof")?;
    }

    Ok(())
}

/// Extract one time point and layer from an HDF5 file into an MGH file.
///
/// The `data` dataset must be a 3D array laid out vertex x time point x
/// layer. The column at time `t` and layer `n` is written as MGH, with the
/// stored affine and header when present and identity/empty defaults
/// otherwise.
pub fn extract_mgh_from_hdf5<P: AsRef<Path>, Q: AsRef<Path>>(
    file_in: P,
    file_out: Q,
    t: usize,
    n: usize,
) -> Result<()> {
    let (data, affine, header) = read_hdf5(&file_in)?;

    if data.ndim() != 3 {
        bail!(
            "Data array has incorrect number of dimensions: expected 3, got {}",
            data.ndim()
        );
    }
    let shape = data.shape().to_vec();
    if t >= shape[1] {
        bail!("time point {} out of range (0..{})", t, shape[1]);
    }
    if n >= shape[2] {
        bail!("layer {} out of range (0..{})", n, shape[2]);
    }

    // Extract one time point and one layer.
    let column = data
        .index_axis(Axis(1), t)
        .index_axis(Axis(1), n)
        .to_owned()
        .into_dyn();

    write_mgh(file_out, &column, affine.as_ref(), header.as_ref())
}
