//! FreeSurfer command wrappers (mri_vol2surf).

use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

use super::run_tool;

/// Surface sampling with mri_vol2surf.
///
/// Samples a volume onto a surface mesh along the given hemisphere,
/// writing per-vertex MGH output.
#[derive(Debug, Clone)]
pub struct MriVol2Surf {
    pub mov: PathBuf,
    pub surf: PathBuf,
    pub hemi: String,
    pub out_file: PathBuf,
    pub interp: String,
}

impl MriVol2Surf {
    /// Create a sampling invocation with trilinear interpolation.
    pub fn new(
        mov: impl Into<PathBuf>,
        surf: impl Into<PathBuf>,
        hemi: impl Into<String>,
        out_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mov: mov.into(),
            surf: surf.into(),
            hemi: hemi.into(),
            out_file: out_file.into(),
            interp: "trilinear".into(),
        }
    }

    /// Set the interpolation (nearest or trilinear).
    pub fn with_interp(mut self, interp: impl Into<String>) -> Self {
        self.interp = interp.into();
        self
    }

    /// The argument list passed to mri_vol2surf.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--mov".into(),
            self.mov.display().to_string(),
            "--surf".into(),
            self.surf.display().to_string(),
            "--hemi".into(),
            self.hemi.clone(),
            "--o".into(),
            self.out_file.display().to_string(),
            "--interp".into(),
            self.interp.clone(),
            "--regheader".into(),
        ]
    }

    /// Run mri_vol2surf.
    pub fn run(&self) -> Result<()> {
        let mut command = Command::new("mri_vol2surf");
        command.args(self.args());
        run_tool(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vol2surf_args() {
        let sample = MriVol2Surf::new("def/volume.nii.gz", "lh.layer5", "lh", "surf/lh.out.mgh");
        let args = sample.args();
        assert_eq!(args[0], "--mov");
        assert!(args.contains(&"--hemi".to_string()));
        assert!(args.contains(&"lh".to_string()));
        assert!(args.contains(&"trilinear".to_string()));
    }

    #[test]
    fn test_vol2surf_nearest() {
        let sample =
            MriVol2Surf::new("v.nii", "rh.layer5", "rh", "out.mgh").with_interp("nearest");
        assert!(sample.args().contains(&"nearest".to_string()));
    }
}
