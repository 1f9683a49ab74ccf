//! EPI <-> EPI <-> ANA registration via SyN.
//!
//! Computes the deformation field between anatomy and EPI in native space
//! by registering two EPIs and chaining an existing EPI <-> ANA
//! deformation through the result:
//!     1. set output folder structure
//!     2. n4 correction epi
//!     3. clean ana (remove ceiling and normalise)
//!     4. mask epi
//!     5. syn
//!     6. merge deformations
//!     7. clean deformations
//!     8. expand deformations
//!     9. apply deformations
//!
//! Needs ANTs and FreeSurfer on the PATH.

use anyhow::{Context, Result};
use ndarray::ArrayD;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::Epi2AnaConfig;
use crate::mask::{clean_ana, mask_ana, mask_epi};
use crate::tools::{AntsApplyTransforms, AntsRegistration, N4BiasFieldCorrection, SynCost};
use rfmri_core::cmap::clean_coordinate_mapping;
use rfmri_core::resample::{apply_coordinate_mapping, Interpolation, Padding};
use rfmri_core::{CoordinateMapping, Volume};
use rfmri_io::nifti_io::{read_cmap, read_nifti, write_cmap, write_nifti};

/// Run the EPI <-> ANA pipeline.
pub fn epi2ana(config: &Epi2AnaConfig) -> Result<()> {
    // Set folder structure.
    let path_temp = config.path_output.join("temp");
    let path_epi_source = path_temp.join("epi_source");
    let path_epi_target = path_temp.join("epi_target");
    let path_t1_source = path_temp.join("t1_source");
    let path_t1_target = path_temp.join("t1_target");
    let path_syn = path_temp.join("syn");
    for dir in [
        &config.path_output,
        &path_temp,
        &path_epi_source,
        &path_epi_target,
        &path_t1_source,
        &path_t1_target,
        &path_syn,
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    // Copy input files.
    copy_into(&config.file_mean_epi_source, &path_epi_source.join("epi.nii"))?;
    copy_into(&config.file_mean_epi_target, &path_epi_target.join("epi.nii"))?;
    for path_t1 in [&path_t1_source, &path_t1_target] {
        copy_into(&config.file_t1, &path_t1.join("T1.nii"))?;
        copy_into(&config.file_mask, &path_t1.join("mask.nii"))?;
    }

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
    for path_t1 in [&path_t1_source, &path_t1_target] {
        clean_ana(path_t1.join("T1.nii"), 1000.0, 4095.0, true)?;
    }

    // Mask t1 and epi.
    info!("masking");
    for (path_epi, path_t1) in [
        (&path_epi_source, &path_t1_source),
        (&path_epi_target, &path_t1_target),
    ] {
        let masked_t1 = mask_ana(path_t1.join("T1.nii"), path_t1.join("mask.nii"), false)?;
        mask_epi(
            path_epi.join("bepi.nii"),
            &masked_t1,
            &path_t1.join("mask.nii"),
            config.niter_mask,
            config.sigma_mask,
            config.file_cmap.as_deref(),
        )?;
    }

    // Syn.
    info!("syn registration");
    let fixed = path_epi_source.join("pbepi.nii");
    let moving = path_epi_target.join("pbepi.nii");
    let mut registration = AntsRegistration::new(&fixed, &moving, path_syn.join("syn"));
    registration.run_rigid = config.syn.run_rigid;
    registration.rigid_iterations = config.syn.rigid_iterations;
    registration.run_affine = config.syn.run_affine;
    registration.affine_iterations = config.syn.affine_iterations;
    registration.run_syn = config.syn.run_syn;
    registration.coarse_iterations = config.syn.coarse_iterations;
    registration.medium_iterations = config.syn.medium_iterations;
    registration.fine_iterations = config.syn.fine_iterations;
    registration.cost_function = match config.syn.cost_function.as_str() {
        "MutualInformation" => SynCost::MutualInformation,
        _ => SynCost::CrossCorrelation,
    };
    registration.interpolation = config.syn.interpolation.clone();
    registration.run()?;

    // Turn the warps into coordinate mappings by pushing identity cmaps
    // through them.
    info!("converting warps to mappings");
    let cmap_moving = path_syn.join("cmap_moving.nii");
    let cmap_fixed = path_syn.join("cmap_fixed.nii");
    write_identity_cmap(&moving, &cmap_moving)?;
    write_identity_cmap(&fixed, &cmap_fixed)?;

    let syn_map = path_syn.join("syn_map.nii.gz");
    AntsApplyTransforms::new(&cmap_moving, &fixed, &syn_map)
        .as_time_series()
        .with_transform(registration.warp_file())
        .with_transform(registration.affine_file())
        .run()?;

    let syn_invmap = path_syn.join("syn_invmap.nii.gz");
    AntsApplyTransforms::new(&cmap_fixed, &moving, &syn_invmap)
        .as_time_series()
        .with_inverse_transform(registration.affine_file())
        .with_transform(registration.inverse_warp_file())
        .run()?;

    // Merge deformations.
    info!("merging deformations");
    let ana2epi_out = config.path_output.join("ana2epi.nii.gz");
    let epi2ana_out = config.path_output.join("epi2ana.nii.gz");
    merge_cmaps(&config.file_ana2epi, &syn_map, &ana2epi_out)?;
    merge_cmaps(&syn_invmap, &config.file_epi2ana, &epi2ana_out)?;

    // Clean deformation.
    if config.clean_cmap {
        info!("cleaning deformations");
        let source = read_cmap(&ana2epi_out)?;
        let target = read_cmap(&epi2ana_out)?;
        let (cleaned, mask) = clean_coordinate_mapping(&source, &target);
        write_cmap(&epi2ana_out, &cleaned)?;

        let mask_volume = Volume::new(
            ArrayD::from_shape_vec(
                mask.shape().to_vec(),
                mask.iter().map(|&m| m as f32).collect(),
            )
            .expect("mask shape covers its elements"),
        )
        .with_affine(*cleaned.affine());
        write_nifti(&config.path_output.join("epi2ana_mask.nii.gz"), &mask_volume)?;
    }

    // Expand deformation.
    if config.expand_cmap {
        info!("expanding deformations");
        for path in [&ana2epi_out, &epi2ana_out] {
            let expanded = read_cmap(path)?.expanded();
            write_cmap(path, &expanded)?;
        }
    }

    // Apply deformation examples.
    info!("applying deformations");
    apply_example(
        &config.file_t1,
        &ana2epi_out,
        &config.path_output.join("ana2epi_example.nii.gz"),
    )?;
    apply_example(
        &config.file_mean_epi_source,
        &epi2ana_out,
        &config.path_output.join("epi2ana_example.nii.gz"),
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

fn write_identity_cmap(reference: &Path, out: &Path) -> Result<()> {
    let volume = read_nifti(reference)?;
    let shape = [volume.shape()[0], volume.shape()[1], volume.shape()[2]];
    let cmap = CoordinateMapping::identity(shape, 0, volume.affine());
    write_cmap(out, &cmap)
}

/// Chain two deformations: resample the first cmap (as a 4D volume)
/// through the second.
fn merge_cmaps(first: &Path, second: &Path, out: &Path) -> Result<()> {
    let first = read_cmap(first)?.into_volume();
    let second = read_cmap(second)?;
    let merged = apply_coordinate_mapping(&first, &second, Interpolation::Linear, Padding::Zero)?;
    write_nifti(out, &merged)
}

fn apply_example(volume_path: &Path, cmap_path: &Path, out: &Path) -> Result<()> {
    let volume = read_nifti(volume_path)?;
    let cmap = read_cmap(cmap_path)?;
    let warped = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero)?;
    write_nifti(out, &warped)
}
