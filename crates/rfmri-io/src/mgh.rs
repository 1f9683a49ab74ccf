//! Reading and writing FreeSurfer MGH/MGZ volumes.

use anyhow::{bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{ArrayD, ShapeBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rfmri_core::{Affine, Volume, VolumeHeader};

pub const MGH_VERSION: i32 = 1;

pub const MRI_UCHAR: i32 = 0;
pub const MRI_INT: i32 = 1;
pub const MRI_FLOAT: i32 = 3;
pub const MRI_SHORT: i32 = 4;

/// The byte offset where the voxel data starts in an MGH file.
pub const MGH_DATA_OFFSET: usize = 284;

/// Header of a FreeSurfer MGH file.
#[derive(Debug, Clone, PartialEq)]
pub struct MghHeader {
    pub version: i32,
    pub dims: [usize; 4],
    pub dtype: i32,
    pub dof: i32,
    pub ras_good: bool,
    /// Voxel size along each axis in mm.
    pub delta: [f32; 3],
    /// Direction cosines, one triplet per volume axis.
    pub mdc: [[f32; 3]; 3],
    /// RAS coordinate of the volume center.
    pub p_xyz_c: [f32; 3],
}

impl MghHeader {
    /// Read an MGH header from the given byte stream.
    ///
    /// Assumes the stream is at the start of the header; on return the
    /// stream is positioned right after the RAS block.
    pub fn from_reader<R: Read>(input: &mut R) -> Result<MghHeader> {
        let version = input.read_i32::<BigEndian>()?;
        if version != MGH_VERSION {
            bail!("unsupported MGH format version: {}", version);
        }

        let mut dims = [0usize; 4];
        for d in dims.iter_mut() {
            *d = input.read_i32::<BigEndian>()? as usize;
        }
        let dtype = input.read_i32::<BigEndian>()?;
        let dof = input.read_i32::<BigEndian>()?;
        let ras_good = input.read_i16::<BigEndian>()? == 1;

        let mut delta = [0.0f32; 3];
        let mut mdc = [[0.0f32; 3]; 3];
        let mut p_xyz_c = [0.0f32; 3];
        if ras_good {
            for v in delta.iter_mut() {
                *v = input.read_f32::<BigEndian>()?;
            }
            for axis in mdc.iter_mut() {
                for v in axis.iter_mut() {
                    *v = input.read_f32::<BigEndian>()?;
                }
            }
            for v in p_xyz_c.iter_mut() {
                *v = input.read_f32::<BigEndian>()?;
            }
        }

        Ok(MghHeader {
            version,
            dims,
            dtype,
            dof,
            ras_good,
            delta,
            mdc,
            p_xyz_c,
        })
    }

    /// Reconstruct the voxel-to-world affine from the RAS block.
    ///
    /// Returns the identity when the geometry is not marked valid.
    pub fn affine(&self) -> Affine {
        if !self.ras_good {
            return Affine::identity();
        }
        let mut rows = [[0.0f64; 4]; 4];
        rows[3][3] = 1.0;
        for r in 0..3 {
            for c in 0..3 {
                rows[r][c] = self.mdc[c][r] as f64 * self.delta[c] as f64;
            }
        }
        // The RAS center sits at the middle of the volume.
        for r in 0..3 {
            let mut shift = 0.0;
            for c in 0..3 {
                shift += rows[r][c] * (self.dims[c] as f64 / 2.0);
            }
            rows[r][3] = self.p_xyz_c[r] as f64 - shift;
        }
        Affine::from_rows(rows)
    }

    /// Derive the RAS block from an affine for the given dims.
    pub fn from_affine(affine: &Affine, dims: [usize; 4], dof: i32) -> MghHeader {
        let mut delta = [0.0f32; 3];
        let mut mdc = [[0.0f32; 3]; 3];
        for c in 0..3 {
            let col = [affine[(0, c)], affine[(1, c)], affine[(2, c)]];
            let norm = (col[0] * col[0] + col[1] * col[1] + col[2] * col[2]).sqrt();
            delta[c] = norm as f32;
            for r in 0..3 {
                mdc[c][r] = if norm > 1e-12 {
                    (col[r] / norm) as f32
                } else if r == c {
                    1.0
                } else {
                    0.0
                };
            }
        }
        let center = affine.apply([
            dims[0] as f64 / 2.0,
            dims[1] as f64 / 2.0,
            dims[2] as f64 / 2.0,
        ]);
        MghHeader {
            version: MGH_VERSION,
            dims,
            dtype: MRI_FLOAT,
            dof,
            ras_good: true,
            delta,
            mdc,
            p_xyz_c: [center[0] as f32, center[1] as f32, center[2] as f32],
        }
    }

    /// Convert into the format-independent volume header.
    pub fn to_volume_header(&self) -> VolumeHeader {
        VolumeHeader {
            dof: self.dof,
            ras_good: self.ras_good,
            delta: self.delta,
            mdc: self.mdc,
            p_xyz_c: self.p_xyz_c,
        }
    }
}

fn is_mgz(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(".mgz"))
        .unwrap_or(false)
}

fn is_mgh(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(".mgh"))
        .unwrap_or(false)
}

/// Read an MGH or MGZ file.
///
/// Voxel data is converted to f32 regardless of the stored type. The
/// returned volume is 4D (width x height x depth x frames) with the affine
/// reconstructed from the RAS block, or identity when absent.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    if is_mgz(path) {
        read_mgh_from(&mut GzDecoder::new(reader))
    } else {
        let mut reader = reader;
        read_mgh_from(&mut reader)
    }
    .with_context(|| format!("Failed to read MGH file {}", path.display()))
}

fn read_mgh_from<R: Read>(input: &mut R) -> Result<Volume> {
    let header = MghHeader::from_reader(input)?;

    // Skip the unused remainder of the fixed-size header.
    let consumed = 4 * 7 + 2 + if header.ras_good { 60 } else { 0 };
    let mut pad = vec![0u8; MGH_DATA_OFFSET - consumed];
    input.read_exact(&mut pad)?;

    let num_voxels: usize = header.dims.iter().product();
    let mut data = Vec::with_capacity(num_voxels);
    match header.dtype {
        MRI_UCHAR => {
            for _ in 0..num_voxels {
                data.push(input.read_u8()? as f32);
            }
        }
        MRI_INT => {
            for _ in 0..num_voxels {
                data.push(input.read_i32::<BigEndian>()? as f32);
            }
        }
        MRI_FLOAT => {
            for _ in 0..num_voxels {
                data.push(input.read_f32::<BigEndian>()?);
            }
        }
        MRI_SHORT => {
            for _ in 0..num_voxels {
                data.push(input.read_i16::<BigEndian>()? as f32);
            }
        }
        other => bail!("unsupported MGH data type: {}", other),
    }

    // MGH stores the first axis fastest.
    let shape = (
        header.dims[0],
        header.dims[1],
        header.dims[2],
        header.dims[3],
    );
    let array = ndarray::Array4::from_shape_vec(shape.f(), data)
        .context("MGH data does not match header dims")?
        .into_dyn();

    Ok(Volume::from_parts(
        array,
        header.affine(),
        header.to_volume_header(),
    ))
}

/// Write an array as a FreeSurfer MGH/MGZ file.
///
/// Two singleton axes are inserted after the leading axis, matching the
/// layout FreeSurfer expects for per-vertex data. When the affine or
/// header is omitted, the identity affine and an empty header are
/// substituted. MGH stores exactly four dims, so axes beyond the fourth
/// fold into the frame dimension (a 3D input lands on disk as
/// width x 1 x 1 x frames).
pub fn write_mgh<P: AsRef<Path>>(
    path: P,
    arr: &ArrayD<f32>,
    affine: Option<&Affine>,
    header: Option<&VolumeHeader>,
) -> Result<()> {
    let path = path.as_ref();
    if !is_mgh(path) && !is_mgz(path) {
        bail!(
            "unsupported output extension for {}: expected .mgh or .mgz",
            path.display()
        );
    }
    if arr.ndim() == 0 || arr.is_empty() {
        bail!("refusing to write an empty volume");
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let leading = arr.shape()[0];
    let frames: usize = arr.shape()[1..].iter().product::<usize>().max(1);
    let dims = [leading, 1, 1, frames];

    let identity = Affine::identity();
    let affine = affine.unwrap_or(&identity);
    let mgh = match header {
        Some(h) if h.ras_good => MghHeader {
            version: MGH_VERSION,
            dims,
            dtype: MRI_FLOAT,
            dof: h.dof,
            ras_good: true,
            delta: h.delta,
            mdc: h.mdc,
            p_xyz_c: h.p_xyz_c,
        },
        Some(h) => MghHeader::from_affine(affine, dims, h.dof),
        None => MghHeader::from_affine(affine, dims, 0),
    };

    // Flatten to (leading, frames); the file stores the leading axis fastest.
    let flat = arr
        .to_owned()
        .into_shape((leading, frames))
        .expect("dims cover every element");

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    if is_mgz(path) {
        let mut writer = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_mgh_to(&mut writer, &mgh, &flat)?;
        writer.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_mgh_to(&mut writer, &mgh, &flat)?;
    }
    Ok(())
}

fn write_mgh_to<W: Write>(
    output: &mut W,
    header: &MghHeader,
    flat: &ndarray::Array2<f32>,
) -> Result<()> {
    output.write_i32::<BigEndian>(header.version)?;
    for &d in &header.dims {
        output.write_i32::<BigEndian>(d as i32)?;
    }
    output.write_i32::<BigEndian>(header.dtype)?;
    output.write_i32::<BigEndian>(header.dof)?;
    output.write_i16::<BigEndian>(if header.ras_good { 1 } else { 0 })?;
    if header.ras_good {
        for &v in &header.delta {
            output.write_f32::<BigEndian>(v)?;
        }
        for axis in &header.mdc {
            for &v in axis {
                output.write_f32::<BigEndian>(v)?;
            }
        }
        for &v in &header.p_xyz_c {
            output.write_f32::<BigEndian>(v)?;
        }
    }
    let consumed = 4 * 7 + 2 + if header.ras_good { 60 } else { 0 };
    output.write_all(&vec![0u8; MGH_DATA_OFFSET - consumed])?;

    for f in 0..flat.shape()[1] {
        for x in 0..flat.shape()[0] {
            output.write_f32::<BigEndian>(flat[[x, f]])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;
    use tempfile::tempdir;

    #[test]
    fn test_write_read_roundtrip_1d() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vertex.mgh");
        let arr = ArrayD::from_shape_vec(vec![5], vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        write_mgh(&path, &arr, None, None).unwrap();
        let volume = read_mgh(&path).unwrap();

        assert_eq!(volume.shape(), &[5, 1, 1, 1]);
        for i in 0..5 {
            assert_eq!(volume.data()[[i, 0, 0, 0]], (i + 1) as f32);
        }
        assert_eq!(volume.affine(), &Affine::identity());
    }

    #[test]
    fn test_write_3d_folds_into_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folded.mgh");
        let arr = ArrayD::from_shape_fn(vec![4, 2, 3], |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f32
        });

        write_mgh(&path, &arr, None, None).unwrap();
        let volume = read_mgh(&path).unwrap();

        // Both singleton axes inserted, trailing axes folded into frames.
        assert_eq!(volume.shape(), &[4, 1, 1, 6]);
        // Frame f = j * 3 + k holds the column (.., j, k).
        assert_eq!(volume.data()[[2, 0, 0, 4]], arr[[2, 1, 1]]);
        assert_eq!(volume.data()[[3, 0, 0, 0]], arr[[3, 0, 0]]);
    }

    #[test]
    fn test_affine_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geometry.mgh");
        let arr = ArrayD::from_shape_vec(vec![4], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let affine = Affine::from_rows([
            [0.0, 0.0, 2.0, -10.0],
            [-2.0, 0.0, 0.0, 30.0],
            [0.0, 2.0, 0.0, -20.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);

        write_mgh(&path, &arr, Some(&affine), None).unwrap();
        let volume = read_mgh(&path).unwrap();

        let read = volume.affine();
        for r in 0..4 {
            for c in 0..4 {
                assert!(
                    (read[(r, c)] - affine[(r, c)]).abs() < 1e-4,
                    "affine mismatch at ({}, {})",
                    r,
                    c
                );
            }
        }
    }

    #[test]
    fn test_header_passthrough() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("header.mgh");
        let arr = ArrayD::from_shape_vec(vec![3], vec![0.0, 1.0, 2.0]).unwrap();
        let header = VolumeHeader {
            dof: 7,
            ras_good: true,
            delta: [0.7, 0.7, 0.7],
            mdc: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            p_xyz_c: [1.0, 2.0, 3.0],
        };

        write_mgh(&path, &arr, None, Some(&header)).unwrap();
        let volume = read_mgh(&path).unwrap();

        assert_eq!(volume.header().dof, 7);
        assert_eq!(volume.header().delta, [0.7, 0.7, 0.7]);
        assert_eq!(volume.header().p_xyz_c, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mgz_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compressed.mgz");
        let arr = ArrayD::from_shape_vec(vec![4], vec![9.0, 8.0, 7.0, 6.0]).unwrap();

        write_mgh(&path, &arr, None, None).unwrap();
        let volume = read_mgh(&path).unwrap();
        assert_eq!(volume.data()[[0, 0, 0, 0]], 9.0);
        assert_eq!(volume.data()[[3, 0, 0, 0]], 6.0);
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("volume.nii");
        let arr = ArrayD::from_shape_vec(vec![2], vec![1.0, 2.0]).unwrap();
        assert!(write_mgh(&path, &arr, None, None).is_err());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("deep.mgh");
        let arr = ArrayD::from_shape_vec(vec![2], vec![1.0, 2.0]).unwrap();
        write_mgh(&path, &arr, None, None).unwrap();
        assert!(path.exists());
    }
}
