//! Mapping volume data onto anatomy surfaces.
//!
//! Source data is transformed with a deformation field and the
//! transformed data is sampled onto surface meshes in the target space.
//! Needs FreeSurfer on the PATH for the surface sampling step.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Map2AnaConfig;
use crate::tools::MriVol2Surf;
use rfmri_core::resample::{apply_coordinate_mapping, Interpolation, Padding};
use rfmri_io::nifti_io::{read_cmap, read_nifti, write_nifti};
use rfmri_io::split_filename;

/// Run the map2ana pipeline.
pub fn map2ana(config: &Map2AnaConfig) -> Result<()> {
    let interpolation = match config.interpolation.as_str() {
        "linear" => Interpolation::Linear,
        "nearest" => Interpolation::Nearest,
        other => bail!("unknown interpolation: {}", other),
    };

    let path_def = config.path_output.join("def");
    let path_surf = config.path_output.join("surf");
    for dir in [&config.path_output, &path_def, &path_surf] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let cmap = read_cmap(&config.deformation)?;

    // Apply deformation.
    let mut deformed: Vec<PathBuf> = Vec::new();
    for input in &config.input_file {
        info!("transforming {}", input.display());
        let volume = read_nifti(input)?;
        let warped = apply_coordinate_mapping(&volume, &cmap, interpolation, Padding::Closest)?;

        let (_, base, _) = split_filename(input);
        let out = path_def.join(format!("{}_def.nii.gz", base));
        write_nifti(&out, &warped)?;
        deformed.push(out);
    }

    // Map to ana.
    for volume in &deformed {
        let (_, volume_base, _) = split_filename(volume);
        for surf in &config.input_surf {
            let hemi = hemisphere(surf)?;
            let surf_name = surf
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("sampling {} onto {}", volume.display(), surf_name);

            let out = path_surf.join(format!("{}_{}.mgh", surf_name, volume_base));
            MriVol2Surf::new(volume, surf, hemi, out).run()?;
        }
    }
    Ok(())
}

/// Hemisphere prefix of a surface file named `<hemi>.<layer>`.
fn hemisphere(surf: &Path) -> Result<String> {
    let name = surf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('.').next() {
        Some(hemi @ ("lh" | "rh")) => Ok(hemi.to_string()),
        _ => bail!(
            "cannot infer hemisphere from surface name {}: expected an lh. or rh. prefix",
            name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hemisphere_prefixes() {
        assert_eq!(hemisphere(Path::new("/anatomy/layer/lh.layer5")).unwrap(), "lh");
        assert_eq!(hemisphere(Path::new("rh.layer0")).unwrap(), "rh");
    }

    #[test]
    fn test_hemisphere_rejects_unprefixed() {
        assert!(hemisphere(Path::new("/anatomy/layer/white")).is_err());
        assert!(hemisphere(Path::new("mh.layer5")).is_err());
    }
}
