//! Pipeline configuration.
//!
//! Each driver is parameterized by a TOML file the user hand-edits, one
//! field per path or parameter the run needs. `write_default` emits a
//! template to start from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parameters of the SyN registration stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynParameters {
    pub run_rigid: bool,
    pub rigid_iterations: u32,
    pub run_affine: bool,
    pub affine_iterations: u32,
    pub run_syn: bool,
    pub coarse_iterations: u32,
    pub medium_iterations: u32,
    pub fine_iterations: u32,
    /// CrossCorrelation or MutualInformation.
    pub cost_function: String,
    /// Linear or NearestNeighbor.
    pub interpolation: String,
}

impl Default for SynParameters {
    fn default() -> Self {
        Self {
            run_rigid: true,
            rigid_iterations: 1000,
            run_affine: false,
            affine_iterations: 1000,
            run_syn: true,
            coarse_iterations: 50,
            medium_iterations: 150,
            fine_iterations: 100,
            cost_function: "CrossCorrelation".into(),
            interpolation: "Linear".into(),
        }
    }
}

/// Configuration of the EPI <-> EPI flirt pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epi2EpiConfig {
    pub file_mean_epi_source: PathBuf,
    pub file_mean_epi_target: PathBuf,
    pub file_t1: PathBuf,
    pub file_mask: PathBuf,
    pub path_output: PathBuf,
    #[serde(default)]
    pub cleanup: bool,
    /// Iterations of the EPI mask dilation.
    #[serde(default = "default_niter_mask")]
    pub niter_mask: u32,
    /// Sigma of the EPI mask dilation in voxels.
    #[serde(default = "default_sigma_mask")]
    pub sigma_mask: f64,
}

/// Configuration of the EPI <-> ANA pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epi2AnaConfig {
    pub file_mean_epi_source: PathBuf,
    pub file_mean_epi_target: PathBuf,
    pub file_t1: PathBuf,
    pub file_mask: PathBuf,
    /// Existing ana -> epi deformation to merge with.
    pub file_ana2epi: PathBuf,
    /// Existing epi -> ana deformation to merge with.
    pub file_epi2ana: PathBuf,
    /// Optional ana -> epi cmap for the EPI masking step.
    #[serde(default)]
    pub file_cmap: Option<PathBuf>,
    pub path_output: PathBuf,
    #[serde(default = "default_true")]
    pub clean_cmap: bool,
    #[serde(default = "default_true")]
    pub expand_cmap: bool,
    #[serde(default)]
    pub cleanup: bool,
    #[serde(default = "default_niter_mask")]
    pub niter_mask: u32,
    #[serde(default = "default_sigma_mask")]
    pub sigma_mask: f64,
    #[serde(default)]
    pub syn: SynParameters,
}

/// Configuration of the map2ana pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map2AnaConfig {
    /// Volumes to transform and sample.
    pub input_file: Vec<PathBuf>,
    /// Surfaces to sample onto, named `<hemi>.<layer>`.
    pub input_surf: Vec<PathBuf>,
    /// Deformation cmap into the target space.
    pub deformation: PathBuf,
    pub path_output: PathBuf,
    /// linear or nearest.
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
}

impl Default for Epi2EpiConfig {
    fn default() -> Self {
        Self {
            file_mean_epi_source: PathBuf::new(),
            file_mean_epi_target: PathBuf::new(),
            file_t1: PathBuf::new(),
            file_mask: PathBuf::new(),
            path_output: PathBuf::new(),
            cleanup: false,
            niter_mask: default_niter_mask(),
            sigma_mask: default_sigma_mask(),
        }
    }
}

impl Default for Epi2AnaConfig {
    fn default() -> Self {
        Self {
            file_mean_epi_source: PathBuf::new(),
            file_mean_epi_target: PathBuf::new(),
            file_t1: PathBuf::new(),
            file_mask: PathBuf::new(),
            file_ana2epi: PathBuf::new(),
            file_epi2ana: PathBuf::new(),
            file_cmap: None,
            path_output: PathBuf::new(),
            clean_cmap: true,
            expand_cmap: true,
            cleanup: false,
            niter_mask: default_niter_mask(),
            sigma_mask: default_sigma_mask(),
            syn: SynParameters::default(),
        }
    }
}

impl Default for Map2AnaConfig {
    fn default() -> Self {
        Self {
            input_file: Vec::new(),
            input_surf: Vec::new(),
            deformation: PathBuf::new(),
            path_output: PathBuf::new(),
            interpolation: default_interpolation(),
        }
    }
}

fn default_niter_mask() -> u32 {
    3
}

fn default_sigma_mask() -> f64 {
    3.0
}

fn default_true() -> bool {
    true
}

fn default_interpolation() -> String {
    "linear".into()
}

/// Load a TOML config file.
pub fn load<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Write a default config template.
pub fn write_default<T: Serialize + Default>(path: &Path) -> Result<()> {
    let text = toml::to_string_pretty(&T::default()).context("Failed to serialize config")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write config template {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_epi2epi_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("epi2epi.toml");

        let mut config = Epi2EpiConfig::default();
        config.file_t1 = PathBuf::from("/data/anatomy/T1.nii");
        config.niter_mask = 5;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let read: Epi2EpiConfig = load(&path).unwrap();
        assert_eq!(read.file_t1, PathBuf::from("/data/anatomy/T1.nii"));
        assert_eq!(read.niter_mask, 5);
        assert!(!read.cleanup);
    }

    #[test]
    fn test_epi2ana_defaults_from_sparse_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("epi2ana.toml");
        std::fs::write(
            &path,
            r#"
file_mean_epi_source = "/data/epi/mean_data.nii"
file_mean_epi_target = "/data/epi2/mean_data.nii"
file_t1 = "/data/anatomy/T1.nii"
file_mask = "/data/anatomy/mask.nii"
file_ana2epi = "/data/deformation/orig2epi.nii.gz"
file_epi2ana = "/data/deformation/epi2orig.nii.gz"
path_output = "/data/deformation/out"
"#,
        )
        .unwrap();

        let config: Epi2AnaConfig = load(&path).unwrap();
        assert!(config.clean_cmap);
        assert!(config.expand_cmap);
        assert_eq!(config.niter_mask, 3);
        assert!(config.syn.run_rigid);
        assert!(!config.syn.run_affine);
        assert_eq!(config.syn.cost_function, "CrossCorrelation");
        assert!(config.file_cmap.is_none());
    }

    #[test]
    fn test_write_default_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("template.toml");
        write_default::<Map2AnaConfig>(&path).unwrap();

        let config: Map2AnaConfig = load(&path).unwrap();
        assert_eq!(config.interpolation, "linear");
        assert!(config.input_file.is_empty());
    }
}
