//! EPI <-> EPI registration via flirt.
//!
//! Computes the deformation fields between two EPI time series:
//!     1. set output folder structure
//!     2. n4 correction epi
//!     3. clean ana (remove ceiling and normalise)
//!     4. mask epi
//!     5. flirt
//!     6. get deformation
//!     7. apply deformations
//!
//! flirt runs on the unpeeled bias-corrected source and target images.
//! Needs FSL and ANTs on the PATH.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::Epi2EpiConfig;
use crate::mask::{clean_ana, mask_ana, mask_epi};
use crate::tools::{ApplyXfm, ConvertXfm, Flirt, FslOutputType, N4BiasFieldCorrection};
use rfmri_core::resample::{apply_coordinate_mapping, Interpolation, Padding};
use rfmri_core::CoordinateMapping;
use rfmri_io::nifti_io::{read_cmap, read_nifti, write_cmap, write_nifti};

/// Run the EPI <-> EPI flirt pipeline.
pub fn epi2epi_flirt(config: &Epi2EpiConfig) -> Result<()> {
    // Set folder structure.
    let path_temp = config.path_output.join("temp");
    let path_epi_source = path_temp.join("epi_source");
    let path_epi_target = path_temp.join("epi_target");
    let path_t1 = path_temp.join("t1");
    let path_flirt = path_temp.join("flirt");
    for dir in [
        &config.path_output,
        &path_temp,
        &path_epi_source,
        &path_epi_target,
        &path_t1,
        &path_flirt,
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    // Copy input files.
    copy_into(&config.file_mean_epi_source, &path_epi_source.join("epi.nii"))?;
    copy_into(&config.file_mean_epi_target, &path_epi_target.join("epi.nii"))?;
    copy_into(&config.file_t1, &path_t1.join("T1.nii"))?;
    copy_into(&config.file_mask, &path_t1.join("mask.nii"))?;

    // Bias field correction to epi.
    info!("bias field correction");
    for path in [&path_epi_source, &path_epi_target] {
        N4BiasFieldCorrection::new(
            path.join("epi.nii"),
            path.join("n4bias.nii"),
            path.join("bepi.nii"),
        )
        .run()?;
    }

    // Clean ana.
    info!("cleaning anatomy");
    clean_ana(path_t1.join("T1.nii"), 1000.0, 4095.0, true)?;

    // Mask t1 and epi.
    info!("masking");
    let masked_t1 = mask_ana(path_t1.join("T1.nii"), path_t1.join("mask.nii"), false)?;
    for path in [&path_epi_source, &path_epi_target] {
        mask_epi(
            path.join("bepi.nii"),
            &masked_t1,
            &path_t1.join("mask.nii"),
            config.niter_mask,
            config.sigma_mask,
            None,
        )?;
    }

    // Flirt.
    info!("flirt");
    let matrix = path_flirt.join("flirt_matrix.mat");
    Flirt::new(
        path_epi_target.join("bepi.nii"),
        path_epi_source.join("bepi.nii"),
        path_flirt.join("flirt.nii"),
        &matrix,
    )
    .with_output_type(FslOutputType::Nifti)
    .run()?;

    // Invert matrix.
    let inv_matrix = path_flirt.join("flirt_inv_matrix.mat");
    ConvertXfm::invert(&matrix, &inv_matrix).run()?;

    // Get cmap.
    info!("generating identity mappings");
    write_identity_cmap(&path_epi_target.join("bepi.nii"), &path_flirt.join("cmap_target.nii"))?;
    write_identity_cmap(&path_epi_source.join("bepi.nii"), &path_flirt.join("cmap_source.nii"))?;

    // Apply flirt to cmap.
    info!("transforming mappings");
    let target2source = config.path_output.join("target2source.nii.gz");
    ApplyXfm::new(
        path_flirt.join("cmap_target.nii"),
        path_epi_source.join("bepi.nii"),
        &matrix,
        &target2source,
    )
    .run()?;

    let source2target = config.path_output.join("source2target.nii.gz");
    ApplyXfm::new(
        path_flirt.join("cmap_source.nii"),
        path_epi_target.join("bepi.nii"),
        &inv_matrix,
        &source2target,
    )
    .run()?;

    // Apply deformation examples.
    info!("applying deformations");
    apply_example(
        &config.file_mean_epi_source,
        &source2target,
        &config.path_output.join("source2target_example.nii.gz"),
    )?;
    apply_example(
        &config.file_mean_epi_target,
        &target2source,
        &config.path_output.join("target2source_example.nii.gz"),
    )?;

    // Clean intermediate files.
    if config.cleanup {
        fs::remove_dir_all(&path_temp).ok();
    }
    Ok(())
}

fn copy_into(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).with_context(|| {
        format!("Failed to copy {} to {}", from.display(), to.display())
    })?;
    Ok(())
}

/// Write the identity cmap for the grid of a reference volume.
fn write_identity_cmap(reference: &Path, out: &Path) -> Result<()> {
    let volume = read_nifti(reference)?;
    if volume.ndim() < 3 {
        bail!(
            "{} has {} dimensions, need at least 3",
            reference.display(),
            volume.ndim()
        );
    }
    let shape = [volume.shape()[0], volume.shape()[1], volume.shape()[2]];
    let cmap = CoordinateMapping::identity(shape, 0, volume.affine());
    write_cmap(out, &cmap)
}

/// Warp a volume through a deformation cmap and write the result.
fn apply_example(volume_path: &Path, cmap_path: &Path, out: &Path) -> Result<()> {
    let volume = read_nifti(volume_path)?;
    let cmap = read_cmap(cmap_path)?;
    let warped = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)?;
    write_nifti(out, &warped)
}
