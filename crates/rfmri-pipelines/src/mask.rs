//! Elementary mask plumbing for the registration pipelines.
//!
//! No skullstripping happens here; the masks come in from upstream tools
//! and these helpers only threshold, rescale, smooth and multiply.

use anyhow::{bail, Context, Result};
use ndarray::Ix3;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::tools::{ApplyXfm, ConvertXfm, Flirt, FslOutputType};
use rfmri_core::filter::GaussianFilter;
use rfmri_core::resample::{apply_coordinate_mapping, Interpolation, Padding};
use rfmri_io::nifti_io::{read_cmap, read_nifti, write_nifti};
use rfmri_io::split_filename;

/// Remove the reconstruction ceiling from an anatomy and rescale it.
///
/// Values below `min_val` are set to zero and the remainder is linearly
/// rescaled so the maximum lands at `new_max`. With `overwrite` the input
/// file is replaced, otherwise a `c`-prefixed copy is written next to it.
///
/// Returns the path of the written file.
pub fn clean_ana<P: AsRef<Path>>(file_in: P, min_val: f32, new_max: f32, overwrite: bool) -> Result<PathBuf> {
    let file_in = file_in.as_ref();
    let mut volume = read_nifti(file_in)?;

    volume.data_mut().mapv_inplace(|v| if v < min_val { 0.0 } else { v });
    let max = volume.data().iter().fold(0.0f32, |a, &b| a.max(b));
    if max > 0.0 {
        let scale = new_max / max;
        volume.data_mut().mapv_inplace(|v| v * scale);
    }

    let file_out = if overwrite {
        file_in.to_path_buf()
    } else {
        prefixed(file_in, "c")
    };
    write_nifti(&file_out, &volume)?;
    Ok(file_out)
}

/// Multiply an anatomy by a binary mask.
///
/// Writes a `p`-prefixed copy next to the input. With `background_bright`
/// the voxels outside the mask are set to the image maximum instead of
/// zero, for registrations against bright-background contrasts.
pub fn mask_ana<P: AsRef<Path>, Q: AsRef<Path>>(
    file_in: P,
    file_mask: Q,
    background_bright: bool,
) -> Result<PathBuf> {
    let file_in = file_in.as_ref();
    let mut volume = read_nifti(file_in)?;
    let mask = read_nifti(file_mask.as_ref())?;

    if volume.shape() != mask.shape() {
        bail!(
            "anatomy and mask shapes differ: {:?} vs {:?}",
            volume.shape(),
            mask.shape()
        );
    }

    let background = if background_bright {
        volume.data().iter().fold(0.0f32, |a, &b| a.max(b))
    } else {
        0.0
    };
    volume
        .data_mut()
        .zip_mut_with(mask.data(), |v, &m| {
            if m == 0.0 {
                *v = background;
            }
        });

    let file_out = prefixed(file_in, "p");
    write_nifti(&file_out, &volume)?;
    Ok(file_out)
}

/// Mask an EPI with an anatomy mask pulled into EPI space.
///
/// When a cmap is given the mask rides through it; otherwise the EPI is
/// rigidly registered to the masked anatomy with flirt and the mask comes
/// back through the inverted matrix. The transported mask is then dilated
/// by `niter` rounds of Gaussian smoothing (sigma in voxels) and
/// re-binarisation before it multiplies the EPI into a `p`-prefixed copy.
pub fn mask_epi<P: AsRef<Path>>(
    file_epi: P,
    file_masked_t1: &Path,
    file_mask: &Path,
    niter: u32,
    sigma: f64,
    file_cmap: Option<&Path>,
) -> Result<PathBuf> {
    let file_epi = file_epi.as_ref();
    let epi = read_nifti(file_epi)?;
    let (dir, _, _) = split_filename(file_epi);

    let mask_in_epi = match file_cmap {
        Some(cmap_path) => {
            info!("transporting mask through {}", cmap_path.display());
            let cmap = read_cmap(cmap_path)?;
            let mask = read_nifti(file_mask)?;
            apply_coordinate_mapping(&mask, &cmap, Interpolation::Nearest, Padding::Zero)?
        }
        None => {
            info!("registering {} to the masked anatomy", file_epi.display());
            let matrix = dir.join("epi2ana.mat");
            let inv_matrix = dir.join("ana2epi.mat");
            Flirt::new(
                file_epi,
                file_masked_t1,
                dir.join("epi2ana.nii"),
                &matrix,
            )
            .run()?;
            ConvertXfm::invert(&matrix, &inv_matrix).run()?;
            let transported = dir.join("mask_epi.nii.gz");
            ApplyXfm::new(file_mask, file_epi, &inv_matrix, &transported)
                .with_interp("nearestneighbour")
                .with_output_type(FslOutputType::NiftiGz)
                .run()?;
            read_nifti(&transported)?
        }
    };

    let mut mask = mask_in_epi
        .data()
        .view()
        .into_dimensionality::<Ix3>()
        .context("EPI mask must be 3D")?
        .to_owned();

    // Grow the mask so the multiplication does not clip cortex.
    let filter = GaussianFilter::new(sigma);
    for _ in 0..niter {
        mask = filter.apply(&mask);
        mask.mapv_inplace(|v| if v > 0.0 { 1.0 } else { 0.0 });
    }

    if epi.shape() != mask.shape() {
        bail!(
            "EPI and transported mask shapes differ: {:?} vs {:?}",
            epi.shape(),
            mask.shape()
        );
    }

    let mut masked = epi;
    masked
        .data_mut()
        .zip_mut_with(&mask.into_dyn(), |v, &m| *v *= m);

    let file_out = prefixed(file_epi, "p");
    write_nifti(&file_out, &masked)?;
    Ok(file_out)
}

/// Prefix the basename of a path.
fn prefixed(path: &Path, prefix: &str) -> PathBuf {
    let (dir, base, ext) = split_filename(path);
    dir.join(format!("{}{}{}", prefix, base, ext))
}
