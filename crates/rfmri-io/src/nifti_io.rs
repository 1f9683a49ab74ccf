//! Reading and writing NIfTI volumes.

use anyhow::{Context, Result};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

use rfmri_core::{Affine, CoordinateMapping, Volume};

/// Read a NIfTI file into a volume.
///
/// The affine is taken from the sform when set, the qform otherwise, and
/// falls back to plain pixdim scaling when neither is valid.
pub fn read_nifti<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header();

    // Sform
    let affine = if header.sform_code > 0 {
        let r0 = header.srow_x;
        let r1 = header.srow_y;
        let r2 = header.srow_z;
        rows_to_affine([r0, r1, r2])
    } else if header.qform_code > 0 {
        // Qform implementation
        // See NIfTI standard
        let b = header.quatern_b;
        let c = header.quatern_c;
        let d = header.quatern_d;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 {
            1.0
        } else {
            header.pixdim[0]
        };

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;

        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;

        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3] * qfac;

        let qx = header.quatern_x;
        let qy = header.quatern_y;
        let qz = header.quatern_z;

        rows_to_affine([
            [r11 * dx, r12 * dy, r13 * dz, qx],
            [r21 * dx, r22 * dy, r23 * dz, qy],
            [r31 * dx, r32 * dy, r33 * dz, qz],
        ])
    } else {
        // Fallback: use pixdim scaling only
        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3];
        rows_to_affine([
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
        ])
    };

    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;

    Ok(Volume::new(data).with_affine(affine))
}

fn rows_to_affine(rows: [[f32; 4]; 3]) -> Affine {
    let mut out = [[0.0f64; 4]; 4];
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            out[r][c] = *v as f64;
        }
    }
    out[3][3] = 1.0;
    Affine::from_rows(out)
}

/// Write a volume to a NIfTI file.
///
/// The affine is stored as the sform. Compression follows the file
/// extension (`.nii` or `.nii.gz`).
pub fn write_nifti<P: AsRef<Path>>(path: P, volume: &Volume) -> Result<()> {
    use nifti::writer::WriterOptions;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let rows = volume.affine().to_rows();
    let row = |r: usize| -> [f32; 4] {
        [
            rows[r][0] as f32,
            rows[r][1] as f32,
            rows[r][2] as f32,
            rows[r][3] as f32,
        ]
    };
    // Voxel sizes from the affine columns keep the header self-consistent.
    let mut pixdim = [1.0f32; 8];
    for c in 0..3 {
        let col = [rows[0][c], rows[1][c], rows[2][c]];
        pixdim[c + 1] = ((col[0] * col[0] + col[1] * col[1] + col[2] * col[2]).sqrt()) as f32;
    }
    pixdim[0] = 1.0;

    let header = NiftiHeader {
        pixdim,
        sform_code: 1,
        qform_code: 0,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        ..Default::default()
    };

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(volume.data())
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;
    Ok(())
}

/// Read a coordinate mapping from a NIfTI file.
///
/// Fails unless the stored volume is 4D with three components along the
/// last axis.
pub fn read_cmap<P: AsRef<Path>>(path: P) -> Result<CoordinateMapping> {
    let path = path.as_ref();
    let volume = read_nifti(path)?;
    let affine = *volume.affine();
    CoordinateMapping::from_dyn(volume.into_data(), affine)
        .with_context(|| format!("{} is not a coordinate mapping", path.display()))
}

/// Write a coordinate mapping to a NIfTI file.
pub fn write_cmap<P: AsRef<Path>>(path: P, cmap: &CoordinateMapping) -> Result<()> {
    write_nifti(path, &cmap.clone().into_volume())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;
    use tempfile::tempdir;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nii");

        let data = ArrayD::from_shape_fn(vec![3, 4, 5], |ix| (ix[0] + 10 * ix[1]) as f32);
        let affine = Affine::from_rows([
            [0.8, 0.0, 0.0, -20.0],
            [0.0, 0.8, 0.0, -30.0],
            [0.0, 0.0, 0.8, -40.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let volume = Volume::new(data).with_affine(affine);

        write_nifti(&path, &volume).unwrap();
        let read = read_nifti(&path).unwrap();

        assert_eq!(read.shape(), &[3, 4, 5]);
        for (a, b) in read.data().iter().zip(volume.data().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        for r in 0..3 {
            for c in 0..4 {
                assert!((read.affine()[(r, c)] - affine[(r, c)]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_gzipped_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.nii.gz");
        let data = ArrayD::from_shape_fn(vec![4, 4, 4], |ix| ix[2] as f32);
        let volume = Volume::new(data);

        write_nifti(&path, &volume).unwrap();
        let read = read_nifti(&path).unwrap();
        assert_eq!(read.shape(), &[4, 4, 4]);
        assert_eq!(read.data()[[0, 0, 3]], 3.0);
    }

    #[test]
    fn test_cmap_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cmap.nii.gz");
        let cmap = CoordinateMapping::identity([4, 5, 6], 0, &Affine::identity());

        write_cmap(&path, &cmap).unwrap();
        let read = read_cmap(&path).unwrap();

        assert_eq!(read.grid_shape(), [4, 5, 6]);
        assert_eq!(read.coordinate([1, 2, 3]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_cmap_rejects_3d() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.nii");
        let volume = Volume::new(ArrayD::zeros(vec![4, 4, 4]));
        write_nifti(&path, &volume).unwrap();
        assert!(read_cmap(&path).is_err());
    }
}
